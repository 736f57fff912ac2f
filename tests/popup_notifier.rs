use page_behaviors::{
    ConsoleLevel, ConsoleMessage, Harness, PageConfig, PopupConfig, PopupState, Result,
};

fn popup_page(message_attr: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
          <head><title>Account</title></head>
          <body {message_attr}>
            <div id="custom-popup" class="popup hidden">
              <div class="popup-content"><p id="popup-message"></p></div>
            </div>
          </body>
        </html>
        "#
    )
}

/// These pages carry no password form; leave that behavior off so it stays quiet.
fn popup_only() -> PageConfig {
    PageConfig::default().with_password_form(None)
}

fn load(html: &str) -> Result<Harness> {
    Harness::from_html_with_config(html, popup_only())
}

#[test]
fn welcome_message_is_shown_then_hidden_after_delay() -> Result<()> {
    let mut harness = load(&popup_page(r#"data-message="Welcome!""#))?;
    harness.assert_popup_state(PopupState::Shown)?;
    harness.assert_text("#popup-message", "Welcome!")?;
    harness.assert_has_class("#custom-popup", "show", true)?;
    harness.assert_has_class("#custom-popup", "hidden", false)?;
    harness.assert_has_class("#custom-popup", "popup", true)?;

    harness.advance_time(1_000)?;
    harness.assert_popup_state(PopupState::Shown)?;

    harness.advance_time(500)?;
    harness.assert_popup_state(PopupState::Hidden)?;
    harness.assert_has_class("#custom-popup", "show", false)?;
    harness.assert_has_class("#custom-popup", "hidden", true)?;
    harness.assert_text("#popup-message", "Welcome!")?;
    assert!(harness.pending_timers().is_empty());
    Ok(())
}

#[test]
fn sentinel_messages_never_show() -> Result<()> {
    for attr in [
        r#"data-message="None""#,
        r#"data-message="  None ""#,
        r#"data-message="""#,
        r#"data-message="   ""#,
        "data-message",
        "",
    ] {
        let mut harness = load(&popup_page(attr))?;
        assert_eq!(harness.popup_state(), PopupState::Hidden, "attr: {attr}");
        assert!(harness.pending_timers().is_empty(), "attr: {attr}");
        harness.assert_text("#popup-message", "")?;
        harness.assert_has_class("#custom-popup", "hidden", true)?;

        harness.flush()?;
        assert_eq!(harness.popup_state(), PopupState::Hidden, "attr: {attr}");
        assert!(harness.console_messages().is_empty(), "attr: {attr}");
    }
    Ok(())
}

#[test]
fn message_text_is_kept_untrimmed_and_decoded() -> Result<()> {
    let harness = load(&popup_page(r#"data-message="  Saved &amp; done  ""#))?;
    harness.assert_popup_state(PopupState::Shown)?;
    harness.assert_text("#popup-message", "  Saved & done  ")?;
    Ok(())
}

#[test]
fn script_trim_decides_visibility() -> Result<()> {
    for (message, expected) in [
        ("\u{FEFF}", PopupState::Hidden),
        ("\u{A0}None\u{3000}", PopupState::Hidden),
        ("\nNone\n", PopupState::Hidden),
        ("\u{85}", PopupState::Shown),
        ("\u{85}None", PopupState::Shown),
    ] {
        let harness = load(&popup_page(&format!(r#"data-message="{message}""#)))?;
        assert_eq!(harness.popup_state(), expected, "message: {message:?}");
        if expected == PopupState::Shown {
            harness.assert_text("#popup-message", message)?;
        }
    }
    Ok(())
}

#[test]
fn lowercase_none_is_a_real_message() -> Result<()> {
    let harness = load(&popup_page(r#"data-message="none""#))?;
    harness.assert_popup_state(PopupState::Shown)?;
    harness.assert_text("#popup-message", "none")?;
    Ok(())
}

#[test]
fn click_on_backdrop_dismisses_immediately() -> Result<()> {
    let mut harness = load(&popup_page(r#"data-message="Saved""#))?;
    harness.advance_time(200)?;
    harness.click("#custom-popup")?;
    harness.assert_popup_state(PopupState::Hidden)?;
    harness.assert_has_class("#custom-popup", "hidden", true)?;

    // The auto-hide still fires later and changes nothing.
    assert_eq!(harness.pending_timers().len(), 1);
    let before = harness.dump_dom("#custom-popup")?;
    harness.flush()?;
    harness.assert_popup_state(PopupState::Hidden)?;
    assert_eq!(harness.dump_dom("#custom-popup")?, before);
    Ok(())
}

#[test]
fn clicks_inside_the_content_do_not_dismiss() -> Result<()> {
    let mut harness = load(&popup_page(r#"data-message="Saved""#))?;
    harness.click("#popup-message")?;
    harness.assert_popup_state(PopupState::Shown)?;
    harness.click(".popup-content")?;
    harness.assert_popup_state(PopupState::Shown)?;

    harness.advance_time(1_500)?;
    harness.assert_popup_state(PopupState::Hidden)?;
    Ok(())
}

#[test]
fn backdrop_click_while_hidden_is_a_no_op() -> Result<()> {
    let mut harness = load(&popup_page(r#"data-message="None""#))?;
    let before = harness.dump_dom("#custom-popup")?;
    harness.click("#custom-popup")?;
    harness.click("#custom-popup")?;
    harness.assert_popup_state(PopupState::Hidden)?;
    assert_eq!(harness.dump_dom("#custom-popup")?, before);
    Ok(())
}

#[test]
fn missing_popup_elements_log_a_warning() -> Result<()> {
    let html = r#"
        <body data-message="Welcome!">
          <div id="custom-popup" class="popup hidden"></div>
        </body>
        "#;
    let mut harness = load(html)?;
    harness.assert_popup_state(PopupState::Hidden)?;
    assert!(harness.pending_timers().is_empty());
    assert_eq!(
        harness.take_console_messages(),
        vec![ConsoleMessage {
            level: ConsoleLevel::Warn,
            text: "Popup elements not found. Check #custom-popup and #popup-message.".into(),
        }]
    );
    assert!(harness.console_messages().is_empty());

    // Clicking the orphan container has no handler behind it.
    harness.click("#custom-popup")?;
    harness.assert_has_class("#custom-popup", "hidden", true)?;
    Ok(())
}

#[test]
fn warning_names_configured_elements() -> Result<()> {
    let config = popup_only().with_popup(Some(PopupConfig {
        container_id: "flash".into(),
        message_id: "flash-text".into(),
        ..PopupConfig::default()
    }));
    let harness = Harness::from_html_with_config(&popup_page(r#"data-message="Hi""#), config)?;
    assert_eq!(
        harness.console_messages(),
        &[ConsoleMessage {
            level: ConsoleLevel::Warn,
            text: "Popup elements not found. Check #flash and #flash-text.".into(),
        }]
    );
    Ok(())
}

#[test]
fn cancel_hide_on_dismiss_clears_the_timer() -> Result<()> {
    let config = popup_only()
        .with_popup(Some(PopupConfig::default().with_cancel_hide_on_dismiss(true)));
    let mut harness =
        Harness::from_html_with_config(&popup_page(r#"data-message="Saved""#), config)?;
    assert_eq!(harness.pending_timers().len(), 1);

    harness.click("#custom-popup")?;
    harness.assert_popup_state(PopupState::Hidden)?;
    assert!(harness.pending_timers().is_empty());
    Ok(())
}

#[test]
fn custom_delay_and_classes_are_honored() -> Result<()> {
    let html = r#"
        <body data-message="Heads up">
          <div id="custom-popup" class="toast is-hidden"><span id="popup-message"></span></div>
        </body>
        "#;
    let config = popup_only().with_popup(Some(PopupConfig {
        shown_class: "is-visible".into(),
        hidden_class: "is-hidden".into(),
        ..PopupConfig::default().with_hide_delay_ms(3_000)
    }));
    let mut harness = Harness::from_html_with_config(html, config)?;
    harness.assert_has_class("#custom-popup", "is-visible", true)?;
    harness.assert_has_class("#custom-popup", "is-hidden", false)?;

    harness.advance_time(2_999)?;
    harness.assert_popup_state(PopupState::Shown)?;
    harness.advance_time_to(3_000)?;
    harness.assert_popup_state(PopupState::Hidden)?;
    harness.assert_has_class("#custom-popup", "is-hidden", true)?;
    Ok(())
}

#[test]
fn zero_delay_hides_on_next_timer_turn() -> Result<()> {
    let config =
        popup_only().with_popup(Some(PopupConfig::default().with_hide_delay_ms(0)));
    let mut harness =
        Harness::from_html_with_config(&popup_page(r#"data-message="Blink""#), config)?;
    harness.assert_popup_state(PopupState::Shown)?;
    assert_eq!(harness.run_due_timers()?, 1);
    harness.assert_popup_state(PopupState::Hidden)?;
    assert_eq!(harness.now_ms(), 0);
    Ok(())
}
