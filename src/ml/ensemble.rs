// ============================================================
// Layer 5 — Regression Ensemble
// ============================================================
// Primary magnitude strategy: one DimensionRegressor per outcome
// column that has a registered regressor policy.
//
// A RegressorRegistry maps semantic column names to a policy:
//
//   additional_indemnity_money                → linear regressor
//   tenant_ordered_to_pay_landlord            → linear regressor
//   tenant_ordered_to_pay_landlord_legal_fees → constant 80
//
// Binding the registry to a ColumnLabelTable instantiates each
// regressor on its column. Names without a policy are skipped:
// their active cells keep the classifier's 1.
//
// The legal-fees constant is a placeholder carried over until a
// fee model exists; it is configurable from the CLI.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::TaggedRecord;
use crate::domain::traits::{ActiveDimension, DimensionRegressor, MagnitudeStrategy, Persistable};
use crate::ml::evaluation::RegressionReport;
use crate::ml::regressor::LinearRegressor;
use crate::ml::trainer::FitOptions;

pub const ADDITIONAL_INDEMNITY_MONEY: &str = "additional_indemnity_money";
pub const TENANT_ORDERED_TO_PAY_LANDLORD: &str = "tenant_ordered_to_pay_landlord";
pub const TENANT_ORDERED_TO_PAY_LANDLORD_LEGAL_FEES: &str = "tenant_ordered_to_pay_landlord_legal_fees";

/// Default amount awarded for legal fees
pub const DEFAULT_LEGAL_FEES: f64 = 80.0;

/// Builds a regressor bound to (name, column)
pub type RegressorFactory = Box<dyn Fn(&str, usize) -> Box<dyn DimensionRegressor>>;

/// What an outcome column gets when it is active
pub enum DimensionPolicy {
    Regressor(RegressorFactory),
    Constant(f64),
}

/// Name → policy table
#[derive(Default)]
pub struct RegressorRegistry {
    policies: BTreeMap<String, DimensionPolicy>,
}

impl RegressorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three lease-dispute amounts
    pub fn with_defaults(options: &FitOptions, legal_fees: f64) -> Self {
        let mut registry = Self::new();
        for name in [ADDITIONAL_INDEMNITY_MONEY, TENANT_ORDERED_TO_PAY_LANDLORD] {
            let options = options.clone();
            registry.register_regressor(name, move |name, column| {
                Box::new(LinearRegressor::new(name, column, options.clone()))
            });
        }
        registry.register_constant(TENANT_ORDERED_TO_PAY_LANDLORD_LEGAL_FEES, legal_fees);
        registry
    }

    pub fn register_regressor<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&str, usize) -> Box<dyn DimensionRegressor> + 'static,
    {
        self.policies.insert(name.into(), DimensionPolicy::Regressor(Box::new(factory)));
        self
    }

    pub fn register_constant(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.policies.insert(name.into(), DimensionPolicy::Constant(value));
        self
    }

    pub fn policy(&self, name: &str) -> Option<&DimensionPolicy> {
        self.policies.get(name)
    }
}

/// Regressors and constants bound to outcome columns.
pub struct RegressionEnsemble {
    labels:     Arc<ColumnLabelTable>,
    regressors: BTreeMap<usize, Box<dyn DimensionRegressor>>,
    constants:  BTreeMap<usize, f64>,
}

impl RegressionEnsemble {
    /// Instantiate the registry's policies for every column of `labels`
    pub fn bind(registry: &RegressorRegistry, labels: Arc<ColumnLabelTable>) -> Self {
        let mut regressors = BTreeMap::new();
        let mut constants  = BTreeMap::new();

        for column in labels.iter() {
            match registry.policy(&column.name) {
                Some(DimensionPolicy::Regressor(factory)) => {
                    regressors.insert(column.index, factory(&column.name, column.index));
                }
                Some(DimensionPolicy::Constant(value)) => {
                    constants.insert(column.index, *value);
                }
                None => tracing::debug!("No magnitude policy for '{}', keeping boolean", column.name),
            }
        }

        Self { labels, regressors, constants }
    }

    /// Put `regressor` on its own column, replacing whatever was there
    pub fn insert_regressor(&mut self, regressor: Box<dyn DimensionRegressor>) {
        let column = regressor.column();
        self.constants.remove(&column);
        self.regressors.insert(column, regressor);
    }

    pub fn regressor(&self, name: &str) -> Option<&dyn DimensionRegressor> {
        self.regressors.values().find(|r| r.name() == name).map(|r| r.as_ref())
    }

    pub fn regressors(&self) -> impl Iterator<Item = &dyn DimensionRegressor> {
        self.regressors.values().map(|r| r.as_ref())
    }

    pub fn labels(&self) -> &Arc<ColumnLabelTable> {
        &self.labels
    }
}

impl MagnitudeStrategy for RegressionEnsemble {
    fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError> {
        for (column, regressor) in self.regressors.iter_mut() {
            if !records.iter().any(|r| r.outcome_active(*column)) {
                tracing::warn!(
                    "Skipping regressor '{}': no record has column {} active",
                    regressor.name(), column,
                );
                continue;
            }
            regressor.train(records)?;
        }
        Ok(())
    }

    fn magnitudes(
        &self,
        facts:  &[f64],
        active: &[ActiveDimension<'_>],
    ) -> Result<BTreeMap<usize, f64>, ModelError> {
        let mut out = BTreeMap::new();
        for dim in active {
            if let Some(regressor) = self.regressors.get(&dim.index) {
                if regressor.is_trained() {
                    out.insert(dim.index, regressor.predict(facts)?);
                } else {
                    // no blob was loaded for it; the resolver keeps 1
                    tracing::warn!("Regressor '{}' is untrained, '{}' left at 1", regressor.name(), dim.name);
                }
            } else if let Some(value) = self.constants.get(&dim.index) {
                out.insert(dim.index, *value);
            }
        }
        Ok(out)
    }

    fn evaluations(&self) -> Vec<(String, RegressionReport)> {
        self.regressors
            .values()
            .filter_map(|r| r.evaluation().map(|e| (r.name().to_string(), e.clone())))
            .collect()
    }
}

impl Persistable for RegressionEnsemble {
    fn save(&self, dir: &Path) -> Result<(), ModelError> {
        for regressor in self.regressors.values() {
            if regressor.is_trained() {
                regressor.save(dir)?;
            } else {
                tracing::debug!("Regressor '{}' untrained, nothing to save", regressor.name());
            }
        }
        Ok(())
    }

    /// Load every bound regressor. A missing blob (a column skipped
    /// at training time) is logged and left untrained.
    fn load(&mut self, dir: &Path) -> Result<(), ModelError> {
        for regressor in self.regressors.values_mut() {
            match regressor.load(dir) {
                Ok(()) => {}
                Err(ModelError::NotFound(path)) => {
                    tracing::warn!("No blob for regressor '{}' at '{}'", regressor.name(), path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name:   String,
        column: usize,
        value:  f64,
    }

    impl Persistable for Fixed {
        fn save(&self, _dir: &Path) -> Result<(), ModelError> { Ok(()) }
        fn load(&mut self, _dir: &Path) -> Result<(), ModelError> { Ok(()) }
    }

    impl DimensionRegressor for Fixed {
        fn name(&self) -> &str { &self.name }
        fn column(&self) -> usize { self.column }
        fn train(&mut self, _records: &[TaggedRecord]) -> Result<(), ModelError> { Ok(()) }
        fn predict(&self, _facts: &[f64]) -> Result<f64, ModelError> { Ok(self.value) }
        fn weights(&self) -> Option<Vec<f32>> { None }
        fn is_trained(&self) -> bool { true }
    }

    fn labels() -> Arc<ColumnLabelTable> {
        Arc::new(ColumnLabelTable::from_names([
            "orders_resiliation",
            ADDITIONAL_INDEMNITY_MONEY,
            TENANT_ORDERED_TO_PAY_LANDLORD_LEGAL_FEES,
            "something_new",
        ]))
    }

    fn registry() -> RegressorRegistry {
        let mut r = RegressorRegistry::new();
        r.register_regressor(ADDITIONAL_INDEMNITY_MONEY, |name, column| {
            Box::new(Fixed { name: name.to_string(), column, value: 999.0 })
        });
        r.register_constant(TENANT_ORDERED_TO_PAY_LANDLORD_LEGAL_FEES, DEFAULT_LEGAL_FEES);
        r
    }

    fn all_active(labels: &ColumnLabelTable) -> Vec<ActiveDimension<'_>> {
        labels
            .iter()
            .map(|c| ActiveDimension { index: c.index, name: c.name.as_str() })
            .collect()
    }

    #[test]
    fn test_bind_uses_label_positions() {
        let e = RegressionEnsemble::bind(&registry(), labels());
        let r = e.regressor(ADDITIONAL_INDEMNITY_MONEY).unwrap();
        assert_eq!(r.column(), 1);
        assert!(e.regressor("orders_resiliation").is_none());
    }

    #[test]
    fn test_magnitudes_follow_policies() {
        let labels = labels();
        let e      = RegressionEnsemble::bind(&registry(), labels.clone());
        let out    = e.magnitudes(&[1.0], &all_active(&labels)).unwrap();
        assert_eq!(out.get(&1), Some(&999.0));
        assert_eq!(out.get(&2), Some(&80.0));
        assert!(!out.contains_key(&0));
        assert!(!out.contains_key(&3));
    }

    #[test]
    fn test_unknown_labels_are_skipped_at_training() {
        let mut e   = RegressionEnsemble::bind(&registry(), labels());
        let records = vec![TaggedRecord::new("1.txt", vec![1.0], vec![], vec![1.0, 500.0, 1.0, 1.0])];
        e.train(&records).unwrap();
        assert_eq!(e.regressors().count(), 1);
    }

    #[test]
    fn test_column_without_positives_is_skipped() {
        let mut registry = RegressorRegistry::new();
        let options      = FitOptions::default();
        registry.register_regressor(ADDITIONAL_INDEMNITY_MONEY, move |name, column| {
            Box::new(LinearRegressor::new(name, column, options.clone()))
        });
        let labels  = labels();
        let mut e   = RegressionEnsemble::bind(&registry, labels.clone());
        let records = vec![TaggedRecord::new("1.txt", vec![1.0], vec![], vec![1.0, 0.0, 0.0, 0.0])];
        e.train(&records).unwrap();
        assert!(!e.regressor(ADDITIONAL_INDEMNITY_MONEY).unwrap().is_trained());

        // nothing saved, and loading tolerates the missing blob
        let dir = tempfile::tempdir().unwrap();
        e.save(dir.path()).unwrap();
        e.load(dir.path()).unwrap();
        assert!(!dir.path().join("additional_indemnity_money_model.bin").exists());

        // still untrained after load: no magnitude, no NotInitialized
        let out = e.magnitudes(&[1.0], &all_active(&labels)).unwrap();
        assert!(!out.contains_key(&1));
    }

    #[test]
    fn test_default_registry() {
        let r = RegressorRegistry::with_defaults(&FitOptions::default(), DEFAULT_LEGAL_FEES);
        assert!(matches!(r.policy(ADDITIONAL_INDEMNITY_MONEY), Some(DimensionPolicy::Regressor(_))));
        assert!(matches!(r.policy(TENANT_ORDERED_TO_PAY_LANDLORD), Some(DimensionPolicy::Regressor(_))));
        assert!(matches!(
            r.policy(TENANT_ORDERED_TO_PAY_LANDLORD_LEGAL_FEES),
            Some(DimensionPolicy::Constant(v)) if *v == 80.0
        ));
        assert!(r.policy("orders_resiliation").is_none());
    }
}
