use std::fmt;

/// A schema rule an entity failed at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub entity: &'static str,
    pub field: String,
    pub reason: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.entity, self.field, self.reason)
    }
}

impl std::error::Error for SchemaViolation {}

/// Declarative validation bound to each entity type. The store runs this once
/// per write; business logic never re-walks required fields.
pub trait Validate {
    fn validate(&self) -> Result<(), SchemaViolation>;
}

/// Collects field rules for one entity. The first failed rule wins.
pub struct Checker {
    entity: &'static str,
    violation: Option<SchemaViolation>,
}

impl Checker {
    pub fn new(entity: &'static str) -> Self {
        Checker {
            entity,
            violation: None,
        }
    }

    pub fn require(&mut self, ok: bool, field: &str, reason: &str) {
        if !ok && self.violation.is_none() {
            self.violation = Some(SchemaViolation {
                entity: self.entity,
                field: field.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    pub fn finish(self) -> Result<(), SchemaViolation> {
        match self.violation {
            Some(v) => Err(v),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failed_rule_is_reported() {
        let mut c = Checker::new("Thing");
        c.require(true, "a", "fine");
        c.require(false, "b", "broken");
        c.require(false, "c", "also broken");

        let violation = c.finish().unwrap_err();
        assert_eq!(violation.field, "b");
        assert_eq!(violation.to_string(), "Thing.b: broken");
    }
}
