use super::*;

/// How far a timer drain may go and whether it may move the clock.
#[derive(Debug, Clone, Copy)]
enum Drain {
    /// Only tasks already due at the current time.
    DueNow,
    /// Every task, jumping the clock to each due time.
    All,
}

impl Drain {
    fn due_limit(self, now_ms: i64) -> Option<i64> {
        match self {
            Self::DueNow => Some(now_ms),
            Self::All => None,
        }
    }
}

impl Harness {
    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let existed = self.scheduler.clear_timeout(timer_id);
        self.trace_timer_line(format!("[timer] clear id={timer_id} existed={existed}"));
        existed
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = std::mem::take(&mut self.scheduler.task_queue).len();
        self.trace_timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    /// Queued timers in the order they would run.
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.scheduler.pending()
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.scheduler.now_ms;
        self.scheduler.now_ms = from.saturating_add(delta_ms);
        let ran = self.drain_timers(Drain::DueNow)?;
        let to = self.scheduler.now_ms;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={delta_ms} from={from} to={to} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let from = self.scheduler.now_ms;
        if target_ms < from {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={from})"
            )));
        }
        self.scheduler.now_ms = target_ms;
        let ran = self.drain_timers(Drain::DueNow)?;
        self.trace_timer_line(format!(
            "[timer] advance_to from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    /// Runs every queued timer, moving the clock forward to each one's due time.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.scheduler.now_ms;
        let ran = self.drain_timers(Drain::All)?;
        let to = self.scheduler.now_ms;
        self.trace_timer_line(format!("[timer] flush from={from} to={to} ran={ran}"));
        Ok(())
    }

    /// Runs the earliest timer even if it is not due yet.
    pub fn run_next_timer(&mut self) -> Result<bool> {
        self.run_one(Drain::All, "run_next")
    }

    pub fn run_next_due_timer(&mut self) -> Result<bool> {
        self.run_one(Drain::DueNow, "run_next_due")
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.drain_timers(Drain::DueNow)?;
        let now_ms = self.scheduler.now_ms;
        self.trace_timer_line(format!("[timer] run_due now_ms={now_ms} ran={ran}"));
        Ok(ran)
    }

    fn run_one(&mut self, drain: Drain, label: &str) -> Result<bool> {
        let due_limit = drain.due_limit(self.scheduler.now_ms);
        let Some(task) = self.scheduler.pop_next(due_limit) else {
            self.trace_timer_line(format!("[timer] {label} none"));
            return Ok(false);
        };
        self.scheduler.now_ms = self.scheduler.now_ms.max(task.due_at);
        self.execute_timer_task(task)?;
        Ok(true)
    }

    fn drain_timers(&mut self, drain: Drain) -> Result<usize> {
        let due_limit = drain.due_limit(self.scheduler.now_ms);
        let mut ran = 0usize;
        while let Some(task) = self.scheduler.pop_next(due_limit) {
            self.scheduler.now_ms = self.scheduler.now_ms.max(task.due_at);
            self.execute_timer_task(task)?;
            ran += 1;
        }
        Ok(ran)
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        self.with_stack(|harness| harness.execute_timer_task_impl(task))
    }

    fn execute_timer_task_impl(&mut self, task: ScheduledTask) -> Result<()> {
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            task.id, task.due_at, self.scheduler.now_ms
        ));

        match task.callback {
            TimerCallback::HidePopup => {
                let hidden = match self.popup.as_mut() {
                    Some(popup) => popup.handle_timer(&mut self.dom, task.id)?,
                    None => false,
                };
                if hidden {
                    self.trace_line(format!("[popup] auto_hide timer={}", task.id));
                }
            }
        }
        Ok(())
    }
}
