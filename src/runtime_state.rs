use super::*;

/// What a registered listener does when its event reaches it.
///
/// Listeners name a behavior hook instead of holding a callback, so the
/// harness owns every piece of mutable state and dispatch stays a plain match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerAction {
    PopupReady,
    PopupBackdropClick,
    PasswordInput,
    ConfirmPasswordInput,
    PasswordFormSubmit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) action: ListenerAction,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    pub(crate) map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, listener: Listener) {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();

        // Re-registering the same action for the same phase is a no-op.
        if listeners.contains(&listener) {
            return;
        }
        listeners.push(listener);
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Capturing => "capture",
            Self::AtTarget => "target",
            Self::Bubbling => "bubble",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) event_phase: EventPhase,
    pub(crate) time_stamp_ms: i64,
    pub(crate) default_prevented: bool,
    pub(crate) bubbles: bool,
    pub(crate) cancelable: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId, time_stamp_ms: i64) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            event_phase: EventPhase::AtTarget,
            time_stamp_ms,
            default_prevented: false,
            bubbles: true,
            cancelable: true,
        }
    }

    /// `DOMContentLoaded`-style notification: cannot be canceled.
    pub(crate) fn lifecycle(event_type: &str, target: NodeId, time_stamp_ms: i64) -> Self {
        let mut event = Self::new(event_type, target, time_stamp_ms);
        event.cancelable = false;
        event
    }

    pub(crate) fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// True when the listener currently running sits on the node the event
    /// was dispatched to, not on an ancestor it bubbled through.
    pub(crate) fn is_at_target(&self) -> bool {
        self.target == self.current_target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerCallback {
    HidePopup,
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: i64,
    pub(crate) due_at: i64,
    pub(crate) order: i64,
    pub(crate) callback: TimerCallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) task_queue: Vec<ScheduledTask>,
    pub(crate) now_ms: i64,
    pub(crate) next_timer_id: i64,
    pub(crate) next_task_order: i64,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

impl SchedulerState {
    /// Queues `callback` to run `delay_ms` after now; negative delays run at now.
    pub(crate) fn set_timeout(&mut self, delay_ms: i64, callback: TimerCallback) -> i64 {
        let task = ScheduledTask {
            id: self.next_timer_id,
            due_at: self.now_ms.saturating_add(delay_ms.max(0)),
            order: self.next_task_order,
            callback,
        };
        self.next_timer_id += 1;
        self.next_task_order += 1;
        let id = task.id;
        self.task_queue.push(task);
        id
    }

    pub(crate) fn clear_timeout(&mut self, timer_id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        self.task_queue.len() != before
    }

    fn next_position(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(position, _)| position)
    }

    pub(crate) fn pop_next(&mut self, due_limit: Option<i64>) -> Option<ScheduledTask> {
        let position = self.next_position(due_limit)?;
        Some(self.task_queue.remove(position))
    }

    pub(crate) fn pending(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }
}

#[derive(Debug)]
pub(crate) struct TraceState {
    pub(crate) enabled: bool,
    pub(crate) events: bool,
    pub(crate) timers: bool,
    pub(crate) logs: VecDeque<String>,
    pub(crate) log_limit: usize,
    pub(crate) to_stderr: bool,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
            to_stderr: true,
        }
    }
}

impl TraceState {
    /// Appends `line`, evicting the oldest entries past the limit.
    pub(crate) fn record(&mut self, line: String) {
        if !self.enabled {
            return;
        }
        if self.to_stderr {
            eprintln!("{line}");
        }
        self.logs.push_back(line);
        self.evict_overflow();
    }

    pub(crate) fn set_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.log_limit = max_entries;
        self.evict_overflow();
        Ok(())
    }

    fn evict_overflow(&mut self) {
        let overflow = self.logs.len().saturating_sub(self.log_limit);
        self.logs.drain(..overflow);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Warn,
    Error,
}

/// A diagnostic the page's own code emitted, as a browser console would show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

/// A form submission that went through (its `submit` event was not canceled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_id: Option<String>,
    pub entries: Vec<(String, String)>,
}
