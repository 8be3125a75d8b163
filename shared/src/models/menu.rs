//! Menu Model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::FingerprintBuilder;
use crate::models::Grade;

/// Priced meal plan attached to a menu-capable event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    /// Price per membership grade, in euros
    pub price: BTreeMap<Grade, f64>,
    pub starters: Vec<String>,
    pub firsts: Vec<String>,
    pub seconds: Vec<String>,
    pub desserts: Vec<String>,
    pub drink_included: bool,
    pub coffee_included: bool,
}

impl Menu {
    /// Price for a member's grade, falling back to the `Unknown` entry when
    /// the grade has no explicit price
    pub fn price_for(&self, grade: Grade) -> Option<f64> {
        self.price
            .get(&grade)
            .or_else(|| self.price.get(&Grade::Unknown))
            .copied()
    }

    /// All course lists in serving order
    pub fn courses(&self) -> [&[String]; 4] {
        [&self.starters, &self.firsts, &self.seconds, &self.desserts]
    }

    pub(crate) fn feed(&self, mut builder: FingerprintBuilder) -> FingerprintBuilder {
        builder = builder.int(self.price.len() as i64);
        for (grade, price) in &self.price {
            builder = builder.field(grade.code()).field(price.to_be_bytes());
        }
        for course in self.courses() {
            builder = builder.int(course.len() as i64);
            for dish in course {
                builder = builder.field(dish);
            }
        }
        builder.flag(self.drink_included).flag(self.coffee_included)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        Menu {
            price: BTreeMap::from([(Grade::Fester, 25.0), (Grade::Unknown, 30.0)]),
            starters: vec!["olives".into()],
            firsts: vec!["paella".into()],
            seconds: vec![],
            desserts: vec!["flam".into()],
            drink_included: true,
            coffee_included: false,
        }
    }

    #[test]
    fn price_lookup_prefers_explicit_grade() {
        assert_eq!(menu().price_for(Grade::Fester), Some(25.0));
    }

    #[test]
    fn price_lookup_falls_back_to_unknown() {
        assert_eq!(menu().price_for(Grade::Jubilat), Some(30.0));
    }

    #[test]
    fn price_lookup_without_fallback_entry() {
        let mut m = menu();
        m.price.remove(&Grade::Unknown);
        assert_eq!(m.price_for(Grade::Jubilat), None);
    }
}
