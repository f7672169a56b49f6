use std::collections::BTreeMap;

use crate::models::{Operation, OperationRecord};

/// Field key → human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

pub const HECTARES_KEY: &str = "hectares_totais";

pub fn product_dose_key(index: usize) -> String {
    format!("produto_{index}_dose")
}

/// Check the numeric fields that must be positive. An absent value means
/// "not filled yet" and is accepted.
pub fn validate_record(record: &OperationRecord) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(hectares) = record.hectares() {
        if hectares <= 0.0 {
            errors.insert(
                HECTARES_KEY.to_string(),
                "Hectares totais deve ser maior que 0".to_string(),
            );
        }
    }

    if let Operation::Aerial(op) = &record.operation {
        for (i, product) in op.produtos.iter().enumerate() {
            if matches!(product.dose_por_hectare, Some(dose) if dose <= 0.0) {
                errors.insert(product_dose_key(i), "Dose deve ser maior que 0".to_string());
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AerialOperation, AerialProduct, GroundOperation, Month, Placeholder};

    fn aerial(hectares: Option<f64>, doses: &[Option<f64>]) -> OperationRecord {
        OperationRecord {
            mes: Month::Janeiro,
            ano: 2024,
            operation: Operation::Aerial(AerialOperation {
                hectares_totais: hectares,
                produtos: doses
                    .iter()
                    .map(|d| AerialProduct {
                        nome: "P".into(),
                        dose_por_hectare: *d,
                        dose_total: None,
                    })
                    .collect(),
                ..AerialOperation::default()
            }),
        }
    }

    #[test]
    fn test_rejects_non_positive_hectares() {
        let errors = validate_record(&aerial(Some(0.0), &[]));
        assert_eq!(
            errors.get(HECTARES_KEY).map(String::as_str),
            Some("Hectares totais deve ser maior que 0")
        );
        assert!(validate_record(&aerial(Some(-3.0), &[])).contains_key(HECTARES_KEY));
    }

    #[test]
    fn test_accepts_absent_or_positive_hectares() {
        assert!(validate_record(&aerial(None, &[])).is_empty());
        assert!(validate_record(&aerial(Some(0.1), &[])).is_empty());
    }

    #[test]
    fn test_product_doses_checked_per_row() {
        let errors = validate_record(&aerial(Some(5.0), &[Some(1.0), Some(0.0), None, Some(-1.0)]));
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("produto_1_dose"));
        assert!(errors.contains_key("produto_3_dose"));
        assert_eq!(errors["produto_1_dose"], "Dose deve ser maior que 0");
    }

    #[test]
    fn test_ground_hectares_checked() {
        let record = OperationRecord {
            mes: Month::Maio,
            ano: 2024,
            operation: Operation::Ground(GroundOperation {
                hectares_totais: Some(0.0),
                ..GroundOperation::default()
            }),
        };
        assert!(validate_record(&record).contains_key(HECTARES_KEY));
    }

    #[test]
    fn test_placeholder_has_nothing_to_check() {
        let record = OperationRecord {
            mes: Month::Maio,
            ano: 2024,
            operation: Operation::Unspecified(Placeholder::default()),
        };
        assert!(validate_record(&record).is_empty());
    }
}
