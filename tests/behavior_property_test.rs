use page_behaviors::{Harness, PageConfig, PopupState, length_error_message, passwords_match};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};

const BEHAVIOR_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/behavior_property_test.txt";
const DEFAULT_BEHAVIOR_PROPTEST_CASES: u32 = 128;

const PAGE_TEMPLATE: &str = r#"
<body data-message="__MESSAGE__">
  <div id="custom-popup" class="popup hidden"><p id="popup-message"></p></div>
  <form id="passwordForm">
    <input id="password" type="password" name="password">
    <span id="passwordError"></span>
    <input id="confirm_password" type="password" name="confirm_password">
    <span id="confirmPasswordError"></span>
    <button id="register">Register</button>
  </form>
</body>
"#;

#[derive(Clone, Debug)]
enum PageAction {
    TypePassword(String),
    TypeConfirm(String),
    ClickBackdrop,
    ClickMessage,
    Submit,
    Advance(i64),
}

fn behavior_proptest_cases() -> u32 {
    std::env::var("PAGE_BEHAVIORS_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BEHAVIOR_PROPTEST_CASES)
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn page_with_message(message: &str) -> String {
    PAGE_TEMPLATE.replace("__MESSAGE__", &escape_attr(message))
}

/// Characters `String.prototype.trim` strips, listed out rather than derived
/// from `char::is_whitespace`.
const SCRIPT_TRIM_CHARS: &[char] = &[
    '\t', '\n', '\u{B}', '\u{C}', '\r', ' ', '\u{A0}', '\u{1680}', '\u{2000}', '\u{2001}',
    '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}',
    '\u{2009}', '\u{200A}', '\u{2028}', '\u{2029}', '\u{202F}', '\u{205F}', '\u{3000}',
    '\u{FEFF}',
];

fn page_would_show(message: &str) -> bool {
    let trimmed = message.trim_matches(SCRIPT_TRIM_CHARS);
    !trimmed.is_empty() && trimmed != "None"
}

fn fail(err: page_behaviors::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

fn password_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('a'),
            Just('b'),
            Just('A'),
            Just('1'),
            Just(' '),
            Just('é'),
            Just('🔑'),
        ],
        0..=9,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn message_strategy() -> BoxedStrategy<String> {
    let padding = "[ \t\n\u{A0}\u{3000}\u{FEFF}\u{85}]{0,3}";
    prop_oneof![
        prop::sample::select(vec![
            "", "None", " None ", "none", "  \t ", "\u{A0}", "\u{FEFF}", "\u{85}",
            "\u{3000}None", "\nNone\n", "\u{A0}None\u{A0}", "\u{85}None\u{85}",
        ])
        .prop_map(String::from),
        prop::string::string_regex(&format!("{padding}(None|none|Hi!)?{padding}")).unwrap(),
        "[ a-zA-Z!&\"]{0,12}",
    ]
    .boxed()
}

fn page_action_strategy() -> BoxedStrategy<PageAction> {
    prop_oneof![
        4 => password_strategy().prop_map(PageAction::TypePassword),
        4 => password_strategy().prop_map(PageAction::TypeConfirm),
        2 => Just(PageAction::ClickBackdrop),
        2 => Just(PageAction::ClickMessage),
        3 => Just(PageAction::Submit),
        2 => (0i64..=2_000).prop_map(PageAction::Advance),
    ]
    .boxed()
}

fn run_action(harness: &mut Harness, action: &PageAction) -> page_behaviors::Result<()> {
    match action {
        PageAction::TypePassword(value) => harness.type_text("#password", value),
        PageAction::TypeConfirm(value) => harness.type_text("#confirm_password", value),
        PageAction::ClickBackdrop => harness.click("#custom-popup"),
        PageAction::ClickMessage => harness.click("#popup-message"),
        PageAction::Submit => harness.click("#register"),
        PageAction::Advance(delta) => harness.advance_time(*delta),
    }
}

fn assert_popup_follows_message(message: &str) -> TestCaseResult {
    let mut harness = Harness::from_html(&page_with_message(message)).map_err(fail)?;
    let expected = if page_would_show(message) {
        PopupState::Shown
    } else {
        PopupState::Hidden
    };
    prop_assert_eq!(harness.popup_state(), expected);
    prop_assert_eq!(
        harness.pending_timers().len(),
        usize::from(expected == PopupState::Shown)
    );
    if expected == PopupState::Shown {
        prop_assert_eq!(harness.text("#popup-message").map_err(fail)?, message);
    }

    harness.flush().map_err(fail)?;
    prop_assert_eq!(harness.popup_state(), PopupState::Hidden);
    Ok(())
}

fn assert_submission_matches_checks(password: &str, confirm: &str) -> TestCaseResult {
    let mut harness = Harness::from_html(&page_with_message("None")).map_err(fail)?;
    harness.type_text("#password", password).map_err(fail)?;
    harness.type_text("#confirm_password", confirm).map_err(fail)?;
    harness.click("#register").map_err(fail)?;

    let length_valid = password.encode_utf16().count() >= 6;
    let match_valid = passwords_match(password, confirm);

    let length_error = harness.text("#passwordError").map_err(fail)?;
    let match_error = harness.text("#confirmPasswordError").map_err(fail)?;
    if length_valid {
        prop_assert_eq!(length_error, "");
    } else {
        prop_assert_eq!(length_error, length_error_message(6));
    }
    if match_valid {
        prop_assert_eq!(match_error, "");
    } else {
        prop_assert_eq!(match_error, "Passwords do not match!");
    }

    let submitted = harness.take_submissions().len();
    prop_assert_eq!(submitted, usize::from(length_valid && match_valid));
    Ok(())
}

fn assert_action_sequence_is_stable(message: &str, actions: &[PageAction]) -> TestCaseResult {
    let mut harness = Harness::from_html(&page_with_message(message)).map_err(fail)?;
    let mut dismissed_or_expired = !page_would_show(message);

    for (step, action) in actions.iter().enumerate() {
        let before = harness.now_ms();
        let outcome = run_action(&mut harness, action);
        prop_assert!(
            outcome.is_ok(),
            "action failed at step {step}: {action:?}, error={outcome:?}, actions={actions:?}"
        );

        match action {
            PageAction::ClickBackdrop => dismissed_or_expired = true,
            PageAction::Advance(delta) if before + delta >= 1_500 => dismissed_or_expired = true,
            _ => {}
        }
        let expected = if dismissed_or_expired {
            PopupState::Hidden
        } else {
            PopupState::Shown
        };
        prop_assert_eq!(
            harness.popup_state(),
            expected,
            "popup state after step {}: {:?}",
            step,
            action
        );
        prop_assert!(harness.console_messages().is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: behavior_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(BEHAVIOR_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn popup_shows_iff_trimmed_message_is_real(message in message_strategy()) {
        assert_popup_follows_message(&message)?;
    }

    #[test]
    fn submission_is_blocked_iff_a_check_fails(
        password in password_strategy(),
        confirm in prop_oneof![password_strategy(), Just(String::from("abcdef"))],
    ) {
        assert_submission_matches_checks(&password, &confirm)?;
    }

    #[test]
    fn random_page_interactions_keep_popup_state_consistent(
        message in message_strategy(),
        actions in vec(page_action_strategy(), 1..=24),
    ) {
        assert_action_sequence_is_stable(&message, &actions)?;
    }
}

#[test]
fn popup_disabled_page_ignores_backdrop_clicks() -> page_behaviors::Result<()> {
    let config = PageConfig::default().with_popup(None);
    let mut harness = Harness::from_html_with_config(&page_with_message("Hello"), config)?;
    harness.click("#custom-popup")?;
    assert_eq!(harness.popup_state(), PopupState::Hidden);
    assert!(harness.pending_timers().is_empty());
    Ok(())
}
