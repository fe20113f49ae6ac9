use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One of the fixed set of data collections that can be backed up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Clients,
    Cases,
    Hearings,
    Tasks,
    FinancialTransactions,
    Adjournments,
    Notes,
    CaseFiles,
    Profiles,
    UserIntegrations,
}

impl Collection {
    /// Every permitted collection, in export order (also declaration order)
    pub const ALL: [Collection; 10] = [
        Collection::Clients,
        Collection::Cases,
        Collection::Hearings,
        Collection::Tasks,
        Collection::FinancialTransactions,
        Collection::Adjournments,
        Collection::Notes,
        Collection::CaseFiles,
        Collection::Profiles,
        Collection::UserIntegrations,
    ];

    /// Parents before children: rows referenced by other collections are
    /// restored first.
    pub const RESTORE_ORDER: [Collection; 10] = [
        Collection::UserIntegrations,
        Collection::Profiles,
        Collection::Clients,
        Collection::Cases,
        Collection::Hearings,
        Collection::Tasks,
        Collection::FinancialTransactions,
        Collection::Adjournments,
        Collection::Notes,
        Collection::CaseFiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Cases => "cases",
            Collection::Hearings => "hearings",
            Collection::Tasks => "tasks",
            Collection::FinancialTransactions => "financial_transactions",
            Collection::Adjournments => "adjournments",
            Collection::Notes => "notes",
            Collection::CaseFiles => "case_files",
            Collection::Profiles => "profiles",
            Collection::UserIntegrations => "user_integrations",
        }
    }

    /// Parse a list of collection names, defaulting to all collections when
    /// the list is empty. Duplicates are collapsed, order follows `ALL`.
    pub fn parse_selection(names: &[String]) -> Result<Vec<Collection>, AppError> {
        if names.is_empty() {
            return Ok(Collection::ALL.to_vec());
        }

        let mut selected = names
            .iter()
            .map(|name| name.parse::<Collection>())
            .collect::<Result<Vec<_>, _>>()?;

        selected.sort_unstable();
        selected.dedup();
        Ok(selected)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| AppError::UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("clients".parse::<Collection>().unwrap(), Collection::Clients);
        assert_eq!(
            "financial_transactions".parse::<Collection>().unwrap(),
            Collection::FinancialTransactions
        );
        assert!(matches!(
            "users".parse::<Collection>(),
            Err(AppError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_empty_selection_defaults_to_all() {
        let selected = Collection::parse_selection(&[]).unwrap();
        assert_eq!(selected, Collection::ALL.to_vec());
    }

    #[test]
    fn test_selection_dedups_and_orders() {
        let names = vec![
            "notes".to_string(),
            "clients".to_string(),
            "notes".to_string(),
        ];
        let selected = Collection::parse_selection(&names).unwrap();
        assert_eq!(selected, vec![Collection::Clients, Collection::Notes]);
    }

    #[test]
    fn test_full_selection_sorts_into_export_order() {
        assert!(Collection::ALL.windows(2).all(|pair| pair[0] < pair[1]));

        let names: Vec<String> = Collection::ALL
            .iter()
            .rev()
            .map(|c| c.as_str().to_string())
            .collect();
        let selected = Collection::parse_selection(&names).unwrap();
        assert_eq!(selected, Collection::ALL.to_vec());
    }

    #[test]
    fn test_restore_order_covers_every_collection() {
        let mut order = Collection::RESTORE_ORDER.to_vec();
        order.sort();
        let mut all = Collection::ALL.to_vec();
        all.sort();
        assert_eq!(order, all);

        let position = |c| Collection::RESTORE_ORDER.iter().position(|x| *x == c);
        assert!(position(Collection::Clients) < position(Collection::Cases));
        assert!(position(Collection::Cases) < position(Collection::Hearings));
        assert!(position(Collection::Profiles) < position(Collection::Clients));
    }
}
