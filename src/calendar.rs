// Fixed calendar-month vocabulary and ordering.
//
// Month columns and month cells arrive in whatever order and spelling the
// source workbook uses; every grouped or tabulated view must agree on
// January..December regardless. Matching is fold-based, so the accented
// Portuguese spellings ("Março") compare equal to their plain forms.
use crate::util::fold;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Month {
    Janeiro,
    Fevereiro,
    Marco,
    Abril,
    Maio,
    Junho,
    Julho,
    Agosto,
    Setembro,
    Outubro,
    Novembro,
    Dezembro,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Janeiro,
        Month::Fevereiro,
        Month::Marco,
        Month::Abril,
        Month::Maio,
        Month::Junho,
        Month::Julho,
        Month::Agosto,
        Month::Setembro,
        Month::Outubro,
        Month::Novembro,
        Month::Dezembro,
    ];

    /// Display name, with the source data's accented spelling.
    pub fn name(self) -> &'static str {
        match self {
            Month::Janeiro => "Janeiro",
            Month::Fevereiro => "Fevereiro",
            Month::Marco => "Março",
            Month::Abril => "Abril",
            Month::Maio => "Maio",
            Month::Junho => "Junho",
            Month::Julho => "Julho",
            Month::Agosto => "Agosto",
            Month::Setembro => "Setembro",
            Month::Outubro => "Outubro",
            Month::Novembro => "Novembro",
            Month::Dezembro => "Dezembro",
        }
    }

    fn folded(self) -> &'static str {
        match self {
            Month::Janeiro => "janeiro",
            Month::Fevereiro => "fevereiro",
            Month::Marco => "marco",
            Month::Abril => "abril",
            Month::Maio => "maio",
            Month::Junho => "junho",
            Month::Julho => "julho",
            Month::Agosto => "agosto",
            Month::Setembro => "setembro",
            Month::Outubro => "outubro",
            Month::Novembro => "novembro",
            Month::Dezembro => "dezembro",
        }
    }

    /// 1-based position in the calendar year.
    pub fn ordinal(self) -> usize {
        Month::ALL.iter().position(|m| *m == self).map(|i| i + 1).unwrap_or(0)
    }

    /// Match a column label or cell against the twelve names, fold-based
    /// and substring-tolerant ("Vendas Março" still matches Março).
    pub fn from_label(label: &str) -> Option<Month> {
        let folded = fold(label);
        if folded.is_empty() {
            return None;
        }
        Month::ALL.iter().copied().find(|m| folded.contains(m.folded()))
    }

    /// Exact fold-equality match, used when ordering free-form name lists.
    pub fn from_name(name: &str) -> Option<Month> {
        let folded = fold(name);
        Month::ALL.iter().copied().find(|m| m.folded() == folded)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Return month names in fixed calendar order. Names that are not one of
/// the twelve sort after all twelve, keeping their relative input order.
pub fn order_month_names(names: &[String]) -> Vec<String> {
    let mut keyed: Vec<(usize, &String)> = names
        .iter()
        .map(|n| {
            let key = Month::from_name(n).map(Month::ordinal).unwrap_or(Month::ALL.len() + 1);
            (key, n)
        })
        .collect();
    // Stable sort: unknown names all share the same key and keep input order.
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, n)| n.clone()).collect()
}
