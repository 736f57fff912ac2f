use super::*;

/// Length as a browser form control reports it: UTF-16 code units.
pub fn password_length(value: &str) -> usize {
    value.encode_utf16().count()
}

pub fn meets_min_length(value: &str, min_length: usize) -> bool {
    password_length(value) >= min_length
}

/// Exact, case-sensitive comparison. No Unicode normalization is applied.
pub fn passwords_match(password: &str, confirm_password: &str) -> bool {
    password == confirm_password
}

pub fn length_error_message(min_length: usize) -> String {
    format!("Password must be at least {min_length} characters long!")
}

/// Outcome of running both checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormValidity {
    pub length_valid: bool,
    pub match_valid: bool,
}

impl FormValidity {
    pub fn is_valid(&self) -> bool {
        self.length_valid && self.match_valid
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PasswordValidator {
    view: PasswordFormView,
    min_length: usize,
    length_message: String,
    mismatch_message: String,
}

impl PasswordValidator {
    pub(crate) fn attach(dom: &Dom, config: &PasswordFormConfig) -> Result<Self> {
        let view = PasswordFormView::resolve(dom, config)?;
        Ok(Self {
            view,
            min_length: config.min_length,
            length_message: config.length_message(),
            mismatch_message: config.mismatch_message.clone(),
        })
    }

    pub(crate) fn view(&self) -> &PasswordFormView {
        &self.view
    }

    /// Writes or clears the length error; returns whether the password is long enough.
    pub(crate) fn check_length(&self, dom: &mut Dom) -> Result<bool> {
        let password = dom.value(self.view.password)?;
        if meets_min_length(&password, self.min_length) {
            dom.set_text_content(self.view.length_error, "")?;
            Ok(true)
        } else {
            dom.set_text_content(self.view.length_error, &self.length_message)?;
            Ok(false)
        }
    }

    /// Writes or clears the mismatch error; returns whether both fields agree.
    pub(crate) fn check_match(&self, dom: &mut Dom) -> Result<bool> {
        let password = dom.value(self.view.password)?;
        let confirm_password = dom.value(self.view.confirm_password)?;
        if passwords_match(&password, &confirm_password) {
            dom.set_text_content(self.view.match_error, "")?;
            Ok(true)
        } else {
            dom.set_text_content(self.view.match_error, &self.mismatch_message)?;
            Ok(false)
        }
    }

    pub(crate) fn validate(&self, dom: &mut Dom) -> Result<FormValidity> {
        let length_valid = self.check_length(dom)?;
        let match_valid = self.check_match(dom)?;
        Ok(FormValidity {
            length_valid,
            match_valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <form id="passwordForm">
          <input id="password" type="password" name="password">
          <span id="passwordError"></span>
          <input id="confirm_password" type="password" name="confirm_password">
          <span id="confirmPasswordError"></span>
        </form>
    "#;

    fn fill(dom: &mut Dom, validator: &PasswordValidator, password: &str, confirm: &str) -> Result<()> {
        dom.set_value(validator.view().password, password)?;
        dom.set_value(validator.view().confirm_password, confirm)?;
        Ok(())
    }

    #[test]
    fn length_counts_utf16_units() {
        assert_eq!(password_length(""), 0);
        assert_eq!(password_length("abcdef"), 6);
        assert_eq!(password_length("héllo"), 5);
        // Outside the BMP: one char, two UTF-16 units.
        assert_eq!(password_length("\u{1F600}"), 2);
        assert!(meets_min_length("ab\u{1F600}\u{1F600}", 6));
        assert!(!meets_min_length("abcde", 6));
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        assert!(passwords_match("Secret1", "Secret1"));
        assert!(!passwords_match("Secret1", "secret1"));
        assert!(!passwords_match("Secret1", "Secret1 "));
        assert!(passwords_match("", ""));
        // Composed vs decomposed forms are different strings.
        assert!(!passwords_match("\u{e9}", "e\u{301}"));
    }

    #[test]
    fn check_length_sets_and_clears_error() -> Result<()> {
        let mut dom = html::parse_html(FORM)?;
        let validator = PasswordValidator::attach(&dom, &PasswordFormConfig::default())?;
        let error = validator.view().length_error;

        fill(&mut dom, &validator, "abc", "")?;
        assert!(!validator.check_length(&mut dom)?);
        assert_eq!(
            dom.text_content(error),
            "Password must be at least 6 characters long!"
        );

        fill(&mut dom, &validator, "abcdef", "")?;
        assert!(validator.check_length(&mut dom)?);
        assert_eq!(dom.text_content(error), "");
        Ok(())
    }

    #[test]
    fn custom_min_length_appears_in_message() -> Result<()> {
        let mut dom = html::parse_html(FORM)?;
        let config = PasswordFormConfig::default().with_min_length(10);
        let validator = PasswordValidator::attach(&dom, &config)?;

        fill(&mut dom, &validator, "abcdefghi", "abcdefghi")?;
        let validity = validator.validate(&mut dom)?;
        assert_eq!(
            validity,
            FormValidity {
                length_valid: false,
                match_valid: true
            }
        );
        assert_eq!(
            dom.text_content(validator.view().length_error),
            "Password must be at least 10 characters long!"
        );
        Ok(())
    }

    #[test]
    fn check_match_is_independent_of_length() -> Result<()> {
        let mut dom = html::parse_html(FORM)?;
        let validator = PasswordValidator::attach(&dom, &PasswordFormConfig::default())?;
        let error = validator.view().match_error;

        fill(&mut dom, &validator, "ab", "abc")?;
        assert!(!validator.check_match(&mut dom)?);
        assert_eq!(dom.text_content(error), "Passwords do not match!");

        fill(&mut dom, &validator, "ab", "ab")?;
        assert!(validator.check_match(&mut dom)?);
        assert_eq!(dom.text_content(error), "");
        Ok(())
    }

    #[test]
    fn attach_fails_on_missing_form_element() -> Result<()> {
        let dom = html::parse_html(r#"<form id="passwordForm"><input id="password"></form>"#)?;
        let err = PasswordValidator::attach(&dom, &PasswordFormConfig::default())
            .expect_err("confirm field is missing");
        assert_eq!(err, Error::ElementNotFound("confirm_password".into()));
        Ok(())
    }
}
