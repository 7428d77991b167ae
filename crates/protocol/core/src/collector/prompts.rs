//! Built-in prompt kinds.
//!
//! Feature code usually wraps one of these with its own shared data rather than
//! implementing [`CollectorPrompt`] from scratch.

use serde_json::{Value, json};

use super::descriptor::{CollectorData, CollectorDescriptor};
use super::prompt::CollectorPrompt;
use super::variants;
use crate::ids::{CollectorId, EpochMillis};

/// Two options: accept (index 0) and refuse (index 1).
#[derive(Clone, Debug, Default)]
pub struct AcceptRefusePrompt {
    pub data: CollectorData,
}

impl AcceptRefusePrompt {
    pub fn new(data: CollectorData) -> Self {
        Self { data }
    }
}

impl CollectorPrompt for AcceptRefusePrompt {
    fn creation_packet(
        &self,
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
    ) -> CollectorDescriptor {
        let options = vec![
            self.build_reaction(variants::ACCEPT, Value::Null),
            self.build_reaction(variants::REFUSE, Value::Null),
        ];
        CollectorDescriptor::new(id, end_time, main_replacement, options, self.data.clone())
    }
}

/// Options numbered `1..=count`.
#[derive(Clone, Debug)]
pub struct NumberedChoicePrompt {
    pub count: u32,
    pub data: CollectorData,
}

impl NumberedChoicePrompt {
    pub fn new(count: u32, data: CollectorData) -> Self {
        Self { count, data }
    }
}

impl CollectorPrompt for NumberedChoicePrompt {
    fn creation_packet(
        &self,
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
    ) -> CollectorDescriptor {
        let options = (1..=self.count)
            .map(|number| self.build_reaction(variants::NUMBER, json!({ "value": number })))
            .collect();
        CollectorDescriptor::new(id, end_time, main_replacement, options, self.data.clone())
    }
}

/// Contribution tiers (e.g. 10 / 50 / 100 coins), optionally followed by a
/// refusal.
#[derive(Clone, Debug)]
pub struct AmountTierPrompt {
    pub amounts: Vec<u64>,
    pub allow_refuse: bool,
    pub data: CollectorData,
}

impl AmountTierPrompt {
    pub fn new(amounts: Vec<u64>, data: CollectorData) -> Self {
        Self {
            amounts,
            allow_refuse: true,
            data,
        }
    }
}

impl CollectorPrompt for AmountTierPrompt {
    fn creation_packet(
        &self,
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
    ) -> CollectorDescriptor {
        let mut options: Vec<_> = self
            .amounts
            .iter()
            .map(|amount| self.build_reaction(variants::AMOUNT, json!({ "amount": amount })))
            .collect();
        if self.allow_refuse {
            options.push(self.build_reaction(variants::REFUSE, Value::Null));
        }
        CollectorDescriptor::new(id, end_time, main_replacement, options, self.data.clone())
    }
}

/// Free-form options identified by name, optionally followed by a refusal.
#[derive(Clone, Debug)]
pub struct NamedOptionsPrompt {
    pub names: Vec<String>,
    pub allow_refuse: bool,
    pub data: CollectorData,
}

impl NamedOptionsPrompt {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>, data: CollectorData) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            allow_refuse: false,
            data,
        }
    }

    pub fn with_refuse(mut self) -> Self {
        self.allow_refuse = true;
        self
    }
}

impl CollectorPrompt for NamedOptionsPrompt {
    fn creation_packet(
        &self,
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
    ) -> CollectorDescriptor {
        let mut options: Vec<_> = self
            .names
            .iter()
            .map(|name| self.build_reaction(variants::NAMED, json!({ "name": name })))
            .collect();
        if self.allow_refuse {
            options.push(self.build_reaction(variants::REFUSE, Value::Null));
        }
        CollectorDescriptor::new(id, end_time, main_replacement, options, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_refuse_has_fixed_layout() {
        let d = AcceptRefusePrompt::default().creation_packet("c".into(), u64::MAX, true);
        assert_eq!(d.options.len(), 2);
        assert!(d.options[0].is(variants::ACCEPT));
        assert_eq!(d.refuse_index(), Some(1));
        assert!(d.main_replacement);
    }

    #[test]
    fn numbered_choice_counts_from_one() {
        let d = NumberedChoicePrompt::new(5, CollectorData::default()).creation_packet(
            "c".into(),
            u64::MAX,
            false,
        );
        assert_eq!(d.options.len(), 5);
        assert_eq!(d.options[0].payload.value(), &json!({ "value": 1 }));
        assert_eq!(d.options[4].payload.value(), &json!({ "value": 5 }));
        assert_eq!(d.refuse_index(), None);
    }

    #[test]
    fn amount_tiers_end_with_refusal() {
        let d = AmountTierPrompt::new(vec![10, 50, 100], CollectorData::default())
            .creation_packet("c".into(), u64::MAX, false);
        assert_eq!(d.options.len(), 4);
        assert_eq!(d.refuse_index(), Some(3));
    }

    #[test]
    fn named_options_carry_names() {
        let d = NamedOptionsPrompt::new(["north", "south"], CollectorData::default())
            .with_refuse()
            .creation_packet("c".into(), u64::MAX, false);
        assert_eq!(d.options[1].payload.value(), &json!({ "name": "south" }));
        assert!(d.options[2].is_refusal());
    }
}
