use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MONTHS: [Month; 12] = [
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Janeiro,
    Fevereiro,
    #[serde(rename = "Março")]
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

    /// 1-based calendar number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Month> {
        MONTHS.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn from_name(name: &str) -> Option<Month> {
        MONTHS.iter().copied().find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn of_date(date: NaiveDate) -> Month {
        // month() is always 1..=12
        MONTHS[date.month0() as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    #[serde(rename = "Operação Aérea")]
    Aerial,
    #[serde(rename = "Operação Terrestre")]
    Ground,
}

pub const OPERATION_TYPES: [OperationType; 2] = [OperationType::Aerial, OperationType::Ground];

impl OperationType {
    pub fn label(self) -> &'static str {
        match self {
            OperationType::Aerial => "Operação Aérea",
            OperationType::Ground => "Operação Terrestre",
        }
    }

    pub fn from_label(label: &str) -> Option<OperationType> {
        OPERATION_TYPES.iter().copied().find(|t| t.label() == label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Em aberto")]
    Open,
    #[serde(rename = "Finalizado")]
    Finished,
}

pub const STATUSES: [Status; 2] = [Status::Open, Status::Finished];

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Open => "Em aberto",
            Status::Finished => "Finalizado",
        }
    }

    pub fn from_label(label: &str) -> Option<Status> {
        STATUSES.iter().copied().find(|s| s.label() == label)
    }
}

// ---------------------------------------------------------------------------
// Operation records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub mes: Month,
    pub ano: i32,
    #[serde(flatten)]
    pub operation: Operation,
}

/// Variant payload, tagged on disk by `tipo_operacao`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo_operacao")]
pub enum Operation {
    #[serde(rename = "Operação Aérea")]
    Aerial(AerialOperation),
    #[serde(rename = "Operação Terrestre")]
    Ground(GroundOperation),
    /// Submitted without choosing a type.
    #[serde(rename = "")]
    Unspecified(Placeholder),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialOperation {
    pub nome_fazenda: String,
    pub talhao_aplicado: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hectares_totais: Option<f64>,
    pub cultura: String,
    pub velocidade: f64,
    pub altura: f64,
    pub status: Status,
    pub produtos: Vec<AerialProduct>,
    pub aeronave: String,
    pub responsavel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialProduct {
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_por_hectare: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundOperation {
    pub nome_fazenda: String,
    pub talhao_aplicado: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hectares_totais: Option<f64>,
    pub cultura: String,
    pub trator: String,
    pub implemento: String,
    pub produtos: Vec<GroundProduct>,
    pub observacao: String,
    pub responsavel: String,
    pub status: Status,
    pub num_produtos_terrestre: u32,
}

impl Default for GroundOperation {
    fn default() -> Self {
        Self {
            nome_fazenda: String::new(),
            talhao_aplicado: String::new(),
            hectares_totais: None,
            cultura: String::new(),
            trator: String::new(),
            implemento: String::new(),
            produtos: Vec::new(),
            observacao: String::new(),
            responsavel: String::new(),
            status: Status::Open,
            num_produtos_terrestre: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProduct {
    pub nome_produto: String,
    pub dose: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholder {
    pub produtos: Vec<serde_json::Value>,
}

impl OperationRecord {
    pub fn operation_type(&self) -> Option<OperationType> {
        match self.operation {
            Operation::Aerial(_) => Some(OperationType::Aerial),
            Operation::Ground(_) => Some(OperationType::Ground),
            Operation::Unspecified(_) => None,
        }
    }

    pub fn type_label(&self) -> &'static str {
        self.operation_type().map(OperationType::label).unwrap_or("")
    }

    pub fn hectares(&self) -> Option<f64> {
        match &self.operation {
            Operation::Aerial(op) => op.hectares_totais,
            Operation::Ground(op) => op.hectares_totais,
            Operation::Unspecified(_) => None,
        }
    }

    pub fn farm(&self) -> &str {
        match &self.operation {
            Operation::Aerial(op) => &op.nome_fazenda,
            Operation::Ground(op) => &op.nome_fazenda,
            Operation::Unspecified(_) => "",
        }
    }

    pub fn plot(&self) -> &str {
        match &self.operation {
            Operation::Aerial(op) => &op.talhao_aplicado,
            Operation::Ground(op) => &op.talhao_aplicado,
            Operation::Unspecified(_) => "",
        }
    }

    pub fn status(&self) -> Option<Status> {
        match &self.operation {
            Operation::Aerial(op) => Some(op.status),
            Operation::Ground(op) => Some(op.status),
            Operation::Unspecified(_) => None,
        }
    }

    /// Only aerial operations that are still open can be finalized.
    pub fn can_finalize(&self) -> bool {
        matches!(&self.operation, Operation::Aerial(op) if op.status == Status::Open)
    }
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Produtos,
    #[serde(rename = "Combustível")]
    Combustivel,
    #[serde(rename = "Manutenção")]
    Manutencao,
    Outros,
}

pub const EXPENSE_CATEGORIES: [ExpenseCategory; 4] = [
    ExpenseCategory::Produtos,
    ExpenseCategory::Combustivel,
    ExpenseCategory::Manutencao,
    ExpenseCategory::Outros,
];

impl ExpenseCategory {
    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Produtos => "Produtos",
            ExpenseCategory::Combustivel => "Combustível",
            ExpenseCategory::Manutencao => "Manutenção",
            ExpenseCategory::Outros => "Outros",
        }
    }

    pub fn from_label(label: &str) -> Option<ExpenseCategory> {
        EXPENSE_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub descricao: String,
    pub valor: f64,
    pub categoria: ExpenseCategory,
    pub data: NaiveDate,
}

impl Expense {
    pub fn year(&self) -> i32 {
        self.data.year()
    }

    pub fn month(&self) -> Month {
        Month::of_date(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_roundtrip_names() {
        for m in MONTHS {
            assert_eq!(Month::from_name(m.name()), Some(m));
            assert_eq!(Month::from_number(m.number()), Some(m));
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!(serde_json::to_string(&Month::Marco).unwrap(), "\"Março\"");
    }

    #[test]
    fn test_aerial_record_json_shape() {
        let json = r#"{
            "mes": "Março", "ano": 2024, "tipo_operacao": "Operação Aérea",
            "nome_fazenda": "Santa Rita", "hectares_totais": 10,
            "status": "Finalizado",
            "produtos": [{"nome": "X", "dose_por_hectare": 2}]
        }"#;
        let record: OperationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.mes, Month::Marco);
        assert_eq!(record.operation_type(), Some(OperationType::Aerial));
        let Operation::Aerial(op) = &record.operation else {
            panic!("expected aerial");
        };
        assert_eq!(op.hectares_totais, Some(10.0));
        assert_eq!(op.status, Status::Finished);
        assert_eq!(op.produtos[0].dose_por_hectare, Some(2.0));
        assert_eq!(op.produtos[0].dose_total, None);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tipo_operacao"], "Operação Aérea");
        assert_eq!(value["mes"], "Março");
    }

    #[test]
    fn test_ground_record_defaults() {
        let json = r#"{"mes": "Maio", "ano": 2023, "tipo_operacao": "Operação Terrestre"}"#;
        let record: OperationRecord = serde_json::from_str(json).unwrap();
        let Operation::Ground(op) = &record.operation else {
            panic!("expected ground");
        };
        assert_eq!(op.num_produtos_terrestre, 1);
        assert_eq!(op.status, Status::Open);
        assert!(op.hectares_totais.is_none());
        assert!(!record.can_finalize());
    }

    #[test]
    fn test_placeholder_record() {
        let json = r#"{"mes": "Maio", "ano": 2023, "tipo_operacao": "", "produtos": []}"#;
        let record: OperationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.operation_type(), None);
        assert_eq!(record.type_label(), "");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["tipo_operacao"], "");
        assert_eq!(back["produtos"], serde_json::json!([]));
    }

    #[test]
    fn test_expense_json_shape() {
        let json = r#"{"descricao": "Diesel", "valor": 350.5, "categoria": "Combustível", "data": "2024-03-12"}"#;
        let e: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(e.categoria, ExpenseCategory::Combustivel);
        assert_eq!(e.year(), 2024);
        assert_eq!(e.month(), Month::Marco);
        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back["data"], "2024-03-12");
        assert_eq!(back["categoria"], "Combustível");
    }

    #[test]
    fn test_can_finalize_only_open_aerial() {
        let mut record = OperationRecord {
            mes: Month::Janeiro,
            ano: 2024,
            operation: Operation::Aerial(AerialOperation::default()),
        };
        assert!(record.can_finalize());
        if let Operation::Aerial(op) = &mut record.operation {
            op.status = Status::Finished;
        }
        assert!(!record.can_finalize());
    }
}
