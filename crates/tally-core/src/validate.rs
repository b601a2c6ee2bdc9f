use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_name: String,
    pub message: String,
}

pub trait ErrorPresenter {
    fn show(&mut self, errors: &[ValidationError]);
    fn mark_field(&mut self, field_name: &str, errored: bool);
}

pub struct FieldValidation<'a> {
    pub field_name: &'a str,
    pub value: &'a str,
    pub rules: &'a [&'a dyn Fn(&str) -> bool],
    pub error_message: &'a str,
}

pub struct Validator {
    errors: Vec<ValidationError>,
    presenter: Box<dyn ErrorPresenter>,
}

impl Validator {
    pub fn new(presenter: Box<dyn ErrorPresenter>) -> Self {
        Self {
            errors: vec![],
            presenter,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn validate_field(
        &mut self,
        field_name: &str,
        value: &str,
        rules: &[&dyn Fn(&str) -> bool],
        error_message: &str,
    ) -> bool {
        let valid = rules.iter().all(|rule| rule(value));
        debug!(field = field_name, valid, "validated field");

        if valid {
            self.remove_error(field_name);
        } else {
            self.insert_error(field_name, error_message);
        }
        valid
    }

    pub fn validate_form(&mut self, validations: &[FieldValidation<'_>]) -> bool {
        let mut all_valid = true;
        for v in validations {
            if !self.validate_field(v.field_name, v.value, v.rules, v.error_message) {
                all_valid = false;
            }
        }
        all_valid
    }

    pub fn clear_errors(&mut self) {
        for error in &self.errors {
            self.presenter.mark_field(&error.field_name, false);
        }
        self.errors.clear();
        self.presenter.show(&self.errors);
    }

    fn insert_error(&mut self, field_name: &str, message: &str) {
        self.errors.retain(|e| e.field_name != field_name);
        self.errors.push(ValidationError {
            field_name: field_name.to_string(),
            message: message.to_string(),
        });
        self.presenter.mark_field(field_name, true);
        self.presenter.show(&self.errors);
    }

    fn remove_error(&mut self, field_name: &str) {
        let before = self.errors.len();
        self.errors.retain(|e| e.field_name != field_name);
        if self.errors.len() != before {
            self.presenter.mark_field(field_name, false);
            self.presenter.show(&self.errors);
        }
    }
}

pub fn range_order_rule<'a>(from: &'a str, to: &'a str) -> impl Fn(&str) -> bool + 'a {
    move |_value: &str| from.is_empty() || to.is_empty() || from <= to
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ErrorPresenter, FieldValidation, ValidationError, Validator, range_order_rule};

    #[derive(Default)]
    struct Recording {
        lines: Vec<String>,
        marked: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct RecordingPresenter(Rc<RefCell<Recording>>);

    impl ErrorPresenter for RecordingPresenter {
        fn show(&mut self, errors: &[ValidationError]) {
            self.0.borrow_mut().lines = errors
                .iter()
                .map(|e| format!("{}: {}", e.field_name, e.message))
                .collect();
        }

        fn mark_field(&mut self, field_name: &str, errored: bool) {
            let mut rec = self.0.borrow_mut();
            if errored {
                rec.marked.push(field_name.to_string());
            } else {
                rec.marked.retain(|f| f != field_name);
            }
        }
    }

    fn required(value: &str) -> bool {
        !value.trim().is_empty()
    }

    #[test]
    fn empty_title_shows_error_then_clears_on_revalidation() {
        let presenter = RecordingPresenter::default();
        let mut validator = Validator::new(Box::new(presenter.clone()));
        let rules: &[&dyn Fn(&str) -> bool] = &[&required];

        assert!(!validator.validate_field("Title", "", rules, "Title is required"));
        assert_eq!(
            presenter.0.borrow().lines,
            vec!["Title: Title is required".to_string()]
        );
        assert_eq!(presenter.0.borrow().marked, vec!["Title".to_string()]);

        assert!(validator.validate_field("Title", "Buy milk", rules, "Title is required"));
        assert!(presenter.0.borrow().lines.is_empty());
        assert!(presenter.0.borrow().marked.is_empty());
    }

    #[test]
    fn replacing_an_error_moves_it_to_the_end() {
        let presenter = RecordingPresenter::default();
        let mut validator = Validator::new(Box::new(presenter.clone()));
        let rules: &[&dyn Fn(&str) -> bool] = &[&required];

        validator.validate_field("Title", "", rules, "Title is required");
        validator.validate_field("Date", "", rules, "Date is required");
        validator.validate_field("Title", "", rules, "Title is still required");

        assert_eq!(
            presenter.0.borrow().lines,
            vec![
                "Date: Date is required".to_string(),
                "Title: Title is still required".to_string(),
            ]
        );
    }

    #[test]
    fn form_validation_collects_every_failure() {
        let presenter = RecordingPresenter::default();
        let mut validator = Validator::new(Box::new(presenter.clone()));

        let ok = validator.validate_form(&[
            FieldValidation {
                field_name: "Title",
                value: "",
                rules: &[&required],
                error_message: "Title is required",
            },
            FieldValidation {
                field_name: "Priority",
                value: "High",
                rules: &[&required],
                error_message: "Priority is required",
            },
            FieldValidation {
                field_name: "Description",
                value: "  ",
                rules: &[&required],
                error_message: "Description is required",
            },
        ]);

        assert!(!ok);
        assert_eq!(validator.errors().len(), 2);
        assert_eq!(presenter.0.borrow().lines.len(), 2);
    }

    #[test]
    fn cross_field_range_rule_errors_both_dates() {
        let presenter = RecordingPresenter::default();
        let mut validator = Validator::new(Box::new(presenter.clone()));

        let from = "2024-03-10";
        let to = "2024-03-02";
        let in_order = range_order_rule(from, to);
        let rule: &dyn Fn(&str) -> bool = &in_order;

        let ok = validator.validate_form(&[
            FieldValidation {
                field_name: "From",
                value: from,
                rules: &[rule],
                error_message: "From must not be after To",
            },
            FieldValidation {
                field_name: "To",
                value: to,
                rules: &[rule],
                error_message: "To must not be before From",
            },
        ]);
        assert!(!ok);
        assert_eq!(validator.errors().len(), 2);

        // Fixing either date clears both on re-evaluation.
        let fixed = range_order_rule("2024-03-01", to);
        let rule: &dyn Fn(&str) -> bool = &fixed;
        let ok = validator.validate_form(&[
            FieldValidation {
                field_name: "From",
                value: "2024-03-01",
                rules: &[rule],
                error_message: "From must not be after To",
            },
            FieldValidation {
                field_name: "To",
                value: to,
                rules: &[rule],
                error_message: "To must not be before From",
            },
        ]);
        assert!(ok);
        assert!(validator.errors().is_empty());
        assert!(presenter.0.borrow().lines.is_empty());
    }

    #[test]
    fn clear_errors_empties_the_region_and_unmarks_fields() {
        let presenter = RecordingPresenter::default();
        let mut validator = Validator::new(Box::new(presenter.clone()));
        let rules: &[&dyn Fn(&str) -> bool] = &[&required];

        validator.validate_field("Title", "", rules, "Title is required");
        validator.validate_field("Date", "", rules, "Date is required");
        validator.clear_errors();

        assert!(validator.errors().is_empty());
        assert!(presenter.0.borrow().lines.is_empty());
        assert!(presenter.0.borrow().marked.is_empty());
    }
}
