//! Message texts - what the user reads after each write.

/// User-facing message texts for one kind of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    subject: &'static str,
}

impl Messages {
    pub const fn for_subject(subject: &'static str) -> Self {
        Messages { subject }
    }

    pub fn subject(&self) -> &'static str {
        self.subject
    }

    pub fn created(&self) -> String {
        format!("your {} was saved", self.subject)
    }

    pub fn updated(&self) -> String {
        format!("your {} was updated", self.subject)
    }

    pub fn deleted(&self) -> String {
        format!("your {} was deleted", self.subject)
    }

    pub fn duplicate(&self) -> String {
        format!("you already have a {} for this subject", self.subject)
    }

    pub fn not_authenticated(&self) -> String {
        format!("sign in to manage your {}", self.subject)
    }

    pub fn create_failed(&self) -> String {
        format!("could not save your {}", self.subject)
    }

    pub fn update_failed(&self) -> String {
        format!("could not update your {}", self.subject)
    }

    pub fn delete_failed(&self) -> String {
        format!("could not delete your {}", self.subject)
    }
}
