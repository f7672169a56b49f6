//! Keyed form models for operation records and expenses.
//!
//! A form keeps every widget value in a map keyed by field key, and derives
//! its field layout from those values on every render. Changing the operation
//! type or the product count only changes which keys are shown: values typed
//! into hidden keys come back when the keys are shown again.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crossterm::event::KeyCode;

use crate::fmt::{decimal, parse_decimal};
use crate::models::{
    AerialOperation, AerialProduct, Expense, ExpenseCategory, GroundOperation, GroundProduct,
    Month, Operation, OperationRecord, OperationType, Placeholder, Status, EXPENSE_CATEGORIES,
    MONTHS, OPERATION_TYPES, STATUSES,
};
use crate::validation::FieldErrors;

pub const MIN_YEAR: i64 = 2000;
pub const MAX_YEAR: i64 = 2100;
pub const MAX_PRODUCTS: i64 = 20;

// Field keys shared by both operation variants
pub const MES: &str = "mes";
pub const ANO: &str = "ano";
pub const TIPO: &str = "tipo_operacao";
pub const NOME_FAZENDA: &str = "nome_fazenda";
pub const TALHAO: &str = "talhao_aplicado";
pub const HECTARES: &str = "hectares_totais";
pub const CULTURA: &str = "cultura";
pub const RESPONSAVEL: &str = "responsavel";

// Ground only
pub const TRATOR: &str = "trator";
pub const IMPLEMENTO: &str = "implemento";
pub const OBSERVACAO: &str = "observacao";
pub const NUM_PRODUTOS_TERRESTRE: &str = "num_produtos_terrestre";

// Aerial only
pub const VELOCIDADE: &str = "velocidade";
pub const ALTURA: &str = "altura";
pub const STATUS: &str = "status";
pub const NUM_PRODUTOS: &str = "num_produtos";
pub const AERONAVE: &str = "aeronave";

// Expense form
pub const DESCRICAO: &str = "descricao";
pub const VALOR: &str = "valor";
pub const CATEGORIA: &str = "categoria";
pub const DATA: &str = "data";

pub fn aerial_name_key(i: usize) -> String {
    format!("produto_nome_{i}")
}

pub fn aerial_dose_key(i: usize) -> String {
    format!("produto_dose_{i}")
}

pub fn aerial_total_key(i: usize) -> String {
    format!("produto_total_{i}")
}

pub fn ground_name_key(i: usize) -> String {
    format!("nome_produto_terrestre_{i}")
}

pub fn ground_dose_key(i: usize) -> String {
    format!("dose_terrestre_{i}")
}

// ---------------------------------------------------------------------------
// Field model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number { min: f64 },
    Integer { min: i64, max: i64 },
    Select { options: Vec<String> },
    Date,
    /// Read-only value derived from other fields.
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    /// Sub-form title rendered above this field (e.g. "Produto 2").
    pub heading: Option<String>,
}

impl FieldSpec {
    fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            heading: None,
        }
    }

    fn text(key: impl Into<String>, label: &str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    fn number(key: impl Into<String>, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number { min: 0.0 })
    }

    fn select(key: &str, label: &str, options: Vec<String>) -> Self {
        Self::new(key, label, FieldKind::Select { options })
    }

    fn with_heading(mut self, heading: String) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self.kind, FieldKind::Computed)
    }
}

pub enum FormEvent {
    Continue,
    Submit,
    Cancel,
}

/// Widget values by key plus the focused field.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: BTreeMap<String, String>,
    focused: usize,
    locked: bool,
}

impl FormState {
    fn new(locked: bool) -> Self {
        Self {
            values: BTreeMap::new(),
            focused: 0,
            locked,
        }
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[cfg(test)]
    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

pub trait Form {
    fn layout(&self) -> Vec<FieldSpec>;
    fn state(&self) -> &FormState;
    fn state_mut(&mut self) -> &mut FormState;

    fn display_value(&self, field: &FieldSpec) -> String {
        self.state().value(&field.key).to_string()
    }

    /// Key of the focused editable field.
    fn focused_key(&self) -> Option<String> {
        let editable: Vec<FieldSpec> = self.layout().into_iter().filter(FieldSpec::is_editable).collect();
        if editable.is_empty() {
            return None;
        }
        let idx = self.state().focused.min(editable.len() - 1);
        Some(editable[idx].key.clone())
    }

    fn handle_key(&mut self, code: KeyCode) -> FormEvent {
        let editable: Vec<FieldSpec> = self.layout().into_iter().filter(FieldSpec::is_editable).collect();
        if editable.is_empty() {
            return match code {
                KeyCode::Esc => FormEvent::Cancel,
                KeyCode::Enter => FormEvent::Submit,
                _ => FormEvent::Continue,
            };
        }
        let count = editable.len();
        let idx = self.state().focused.min(count - 1);
        let field = &editable[idx];
        let locked = self.state().locked;

        match code {
            KeyCode::Esc => return FormEvent::Cancel,
            KeyCode::Enter => return FormEvent::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.state_mut().focused = (idx + 1) % count;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.state_mut().focused = if idx == 0 { count - 1 } else { idx - 1 };
            }
            KeyCode::Left | KeyCode::Right if !locked => {
                let delta: i64 = if code == KeyCode::Left { -1 } else { 1 };
                step_field(self.state_mut(), field, delta);
            }
            KeyCode::Char(c) if !locked => {
                if accepts_char(&field.kind, c) {
                    let mut value = self.state().value(&field.key).to_string();
                    value.push(c);
                    self.state_mut().set(field.key.clone(), value);
                }
            }
            KeyCode::Backspace if !locked => {
                if !matches!(field.kind, FieldKind::Select { .. }) {
                    let mut value = self.state().value(&field.key).to_string();
                    value.pop();
                    self.state_mut().set(field.key.clone(), value);
                }
            }
            _ => {}
        }

        // The layout may have shrunk (type or count changed)
        let editable_now = self.layout().iter().filter(|f| f.is_editable()).count();
        let state = self.state_mut();
        state.focused = state.focused.min(editable_now.saturating_sub(1));
        FormEvent::Continue
    }
}

fn accepts_char(kind: &FieldKind, c: char) -> bool {
    match kind {
        FieldKind::Text => true,
        FieldKind::Number { .. } => c.is_ascii_digit() || c == '.' || c == ',',
        FieldKind::Integer { .. } => c.is_ascii_digit(),
        FieldKind::Date => c.is_ascii_digit() || c == '-',
        FieldKind::Select { .. } | FieldKind::Computed => false,
    }
}

/// Left/Right: cycle a selector, or nudge an integer within its range.
fn step_field(state: &mut FormState, field: &FieldSpec, delta: i64) {
    match &field.kind {
        FieldKind::Select { options } if !options.is_empty() => {
            let len = options.len() as i64;
            let current = options
                .iter()
                .position(|o| o == state.value(&field.key))
                .map(|p| p as i64)
                .unwrap_or(if delta > 0 { -1 } else { 0 });
            let next = (current + delta).rem_euclid(len) as usize;
            state.set(field.key.clone(), options[next].clone());
        }
        FieldKind::Integer { min, max } => {
            let current = state.value(&field.key).trim().parse::<i64>().unwrap_or(*min);
            let next = (current + delta).clamp(*min, *max);
            state.set(field.key.clone(), next.to_string());
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Value readers used during assembly
// ---------------------------------------------------------------------------

fn read_number(state: &FormState, key: &str, min: f64, errors: &mut FieldErrors) -> f64 {
    match parse_decimal(state.value(key)) {
        Some(v) if v >= min => v,
        Some(_) => {
            errors.insert(key.to_string(), format!("Valor deve ser maior ou igual a {}", decimal(min)));
            0.0
        }
        None => {
            errors.insert(key.to_string(), "Valor numérico inválido".to_string());
            0.0
        }
    }
}

fn read_integer(state: &FormState, key: &str, min: i64, max: i64, errors: &mut FieldErrors) -> i64 {
    match state.value(key).trim().parse::<i64>() {
        Ok(v) if (min..=max).contains(&v) => v,
        _ => {
            errors.insert(key.to_string(), format!("Valor deve estar entre {min} e {max}"));
            min
        }
    }
}

/// Lenient count used for layout while the user is still typing.
fn count_value(state: &FormState, key: &str) -> usize {
    state
        .value(key)
        .trim()
        .parse::<i64>()
        .unwrap_or(0)
        .clamp(0, MAX_PRODUCTS) as usize
}

// ---------------------------------------------------------------------------
// Operation record form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordForm {
    state: FormState,
}

impl RecordForm {
    /// Build a form seeded from `prior` (the record being edited, if any).
    ///
    /// The prior record's type wins over `last_type`, the session's last
    /// selector choice. `locked` disables all value edits.
    pub fn new(
        prior: Option<&OperationRecord>,
        last_type: Option<OperationType>,
        locked: bool,
        current_year: i32,
    ) -> Self {
        let mut state = FormState::new(locked);
        state.set(MES, prior.map(|r| r.mes).unwrap_or(Month::Janeiro).name());
        state.set(ANO, prior.map(|r| r.ano).unwrap_or(current_year).to_string());
        let op_type = prior.and_then(OperationRecord::operation_type).or(last_type);
        state.set(TIPO, op_type.map(OperationType::label).unwrap_or(""));
        state.set(STATUS, Status::Open.label());
        state.set(NUM_PRODUTOS, "1");
        state.set(NUM_PRODUTOS_TERRESTRE, "1");

        if let Some(record) = prior {
            match &record.operation {
                Operation::Aerial(op) => {
                    seed_common(&mut state, &op.nome_fazenda, &op.talhao_aplicado, op.hectares_totais, &op.cultura, &op.responsavel);
                    state.set(VELOCIDADE, decimal(op.velocidade));
                    state.set(ALTURA, decimal(op.altura));
                    state.set(STATUS, op.status.label());
                    state.set(AERONAVE, op.aeronave.clone());
                    state.set(NUM_PRODUTOS, op.produtos.len().to_string());
                    for (i, product) in op.produtos.iter().enumerate() {
                        state.set(aerial_name_key(i), product.nome.clone());
                        state.set(aerial_dose_key(i), decimal(product.dose_por_hectare.unwrap_or(0.0)));
                    }
                }
                Operation::Ground(op) => {
                    seed_common(&mut state, &op.nome_fazenda, &op.talhao_aplicado, op.hectares_totais, &op.cultura, &op.responsavel);
                    state.set(TRATOR, op.trator.clone());
                    state.set(IMPLEMENTO, op.implemento.clone());
                    state.set(OBSERVACAO, op.observacao.clone());
                    state.set(NUM_PRODUTOS_TERRESTRE, op.num_produtos_terrestre.to_string());
                    for (i, product) in op.produtos.iter().enumerate() {
                        state.set(ground_name_key(i), product.nome_produto.clone());
                        state.set(ground_dose_key(i), decimal(product.dose));
                    }
                }
                Operation::Unspecified(_) => {}
            }
        }

        Self { state }
    }

    pub fn operation_type(&self) -> Option<OperationType> {
        OperationType::from_label(self.state.value(TIPO))
    }

    #[cfg(test)]
    pub fn set_value(&mut self, key: &str, value: &str) {
        self.state.set(key, value);
    }

    #[cfg(test)]
    pub fn value(&self, key: &str) -> &str {
        self.state.value(key)
    }

    /// Number of product rows currently shown for the selected type.
    pub fn product_count(&self) -> usize {
        match self.operation_type() {
            Some(OperationType::Aerial) => count_value(&self.state, NUM_PRODUTOS),
            Some(OperationType::Ground) => count_value(&self.state, NUM_PRODUTOS_TERRESTRE),
            None => 0,
        }
    }

    /// Live total for aerial product row `i`: hectares × dose per hectare.
    pub fn dose_total(&self, i: usize) -> f64 {
        let hectares = parse_decimal(self.state.value(HECTARES)).unwrap_or(0.0);
        let dose = parse_decimal(self.state.value(&aerial_dose_key(i))).unwrap_or(0.0);
        hectares * dose
    }

    /// Build the record for the selected type. Unparsable or out-of-range
    /// numbers are reported per field.
    pub fn assemble(&self) -> Result<OperationRecord, FieldErrors> {
        let mut errors = FieldErrors::new();
        let state = &self.state;

        let mes = Month::from_name(state.value(MES)).unwrap_or(Month::Janeiro);
        let ano = read_integer(state, ANO, MIN_YEAR, MAX_YEAR, &mut errors) as i32;

        let operation = match self.operation_type() {
            Some(OperationType::Aerial) => {
                let hectares = read_number(state, HECTARES, 0.0, &mut errors);
                let count = read_integer(state, NUM_PRODUTOS, 0, MAX_PRODUCTS, &mut errors) as usize;
                let produtos = (0..count)
                    .map(|i| {
                        let dose = read_number(state, &aerial_dose_key(i), 0.0, &mut errors);
                        AerialProduct {
                            nome: state.value(&aerial_name_key(i)).to_string(),
                            dose_por_hectare: Some(dose),
                            dose_total: Some(hectares * dose),
                        }
                    })
                    .collect();
                Operation::Aerial(AerialOperation {
                    nome_fazenda: state.value(NOME_FAZENDA).to_string(),
                    talhao_aplicado: state.value(TALHAO).to_string(),
                    hectares_totais: Some(hectares),
                    cultura: state.value(CULTURA).to_string(),
                    velocidade: read_number(state, VELOCIDADE, 0.0, &mut errors),
                    altura: read_number(state, ALTURA, 0.0, &mut errors),
                    status: Status::from_label(state.value(STATUS)).unwrap_or_default(),
                    produtos,
                    aeronave: state.value(AERONAVE).to_string(),
                    responsavel: state.value(RESPONSAVEL).to_string(),
                })
            }
            Some(OperationType::Ground) => {
                let hectares = read_number(state, HECTARES, 0.0, &mut errors);
                let count = read_integer(state, NUM_PRODUTOS_TERRESTRE, 0, MAX_PRODUCTS, &mut errors);
                let produtos = (0..count as usize)
                    .map(|i| GroundProduct {
                        nome_produto: state.value(&ground_name_key(i)).to_string(),
                        dose: read_number(state, &ground_dose_key(i), 0.0, &mut errors),
                    })
                    .collect();
                Operation::Ground(GroundOperation {
                    nome_fazenda: state.value(NOME_FAZENDA).to_string(),
                    talhao_aplicado: state.value(TALHAO).to_string(),
                    hectares_totais: Some(hectares),
                    cultura: state.value(CULTURA).to_string(),
                    trator: state.value(TRATOR).to_string(),
                    implemento: state.value(IMPLEMENTO).to_string(),
                    produtos,
                    observacao: state.value(OBSERVACAO).to_string(),
                    responsavel: state.value(RESPONSAVEL).to_string(),
                    status: Status::Open,
                    num_produtos_terrestre: count as u32,
                })
            }
            None => Operation::Unspecified(Placeholder::default()),
        };

        if errors.is_empty() {
            Ok(OperationRecord { mes, ano, operation })
        } else {
            Err(errors)
        }
    }
}

fn seed_common(
    state: &mut FormState,
    farm: &str,
    plot: &str,
    hectares: Option<f64>,
    crop: &str,
    responsible: &str,
) {
    state.set(NOME_FAZENDA, farm);
    state.set(TALHAO, plot);
    state.set(HECTARES, decimal(hectares.unwrap_or(0.0)));
    state.set(CULTURA, crop);
    state.set(RESPONSAVEL, responsible);
}

fn shared_head() -> Vec<FieldSpec> {
    vec![
        FieldSpec::text(NOME_FAZENDA, "Nome da fazenda"),
        FieldSpec::text(TALHAO, "Talhão aplicado"),
        FieldSpec::number(HECTARES, "Hectares totais"),
        FieldSpec::text(CULTURA, "Cultura"),
    ]
}

fn count_field(key: &str) -> FieldSpec {
    FieldSpec::new(key, "Número de Produtos", FieldKind::Integer { min: 0, max: MAX_PRODUCTS })
}

impl Form for RecordForm {
    fn layout(&self) -> Vec<FieldSpec> {
        let mut fields = vec![
            FieldSpec::select(MES, "Mês", MONTHS.iter().map(|m| m.name().to_string()).collect()),
            FieldSpec::new(ANO, "Ano", FieldKind::Integer { min: MIN_YEAR, max: MAX_YEAR }),
            FieldSpec::select(
                TIPO,
                "Operação",
                std::iter::once(String::new())
                    .chain(OPERATION_TYPES.iter().map(|t| t.label().to_string()))
                    .collect(),
            ),
        ];

        match self.operation_type() {
            Some(OperationType::Ground) => {
                fields.extend(shared_head());
                fields.push(FieldSpec::text(TRATOR, "Trator"));
                fields.push(FieldSpec::text(IMPLEMENTO, "Implemento"));
                fields.push(count_field(NUM_PRODUTOS_TERRESTRE));
                for i in 0..self.product_count() {
                    fields.push(
                        FieldSpec::text(ground_name_key(i), "Nome do Produto")
                            .with_heading(format!("Produto {}", i + 1)),
                    );
                    fields.push(FieldSpec::number(ground_dose_key(i), "Dose"));
                }
                fields.push(FieldSpec::text(OBSERVACAO, "Observação"));
                fields.push(FieldSpec::text(RESPONSAVEL, "Responsável pela Operação"));
            }
            Some(OperationType::Aerial) => {
                fields.extend(shared_head());
                fields.push(FieldSpec::number(VELOCIDADE, "Velocidade"));
                fields.push(FieldSpec::number(ALTURA, "Altura"));
                fields.push(FieldSpec::select(
                    STATUS,
                    "Status",
                    STATUSES.iter().map(|s| s.label().to_string()).collect(),
                ));
                fields.push(count_field(NUM_PRODUTOS));
                for i in 0..self.product_count() {
                    fields.push(
                        FieldSpec::text(aerial_name_key(i), "Nome do Produto")
                            .with_heading(format!("Produto {}", i + 1)),
                    );
                    fields.push(FieldSpec::number(aerial_dose_key(i), "Dose por Hectare"));
                    fields.push(FieldSpec::new(aerial_total_key(i), "Dose Total", FieldKind::Computed));
                }
                fields.push(FieldSpec::text(AERONAVE, "Aeronave"));
                fields.push(FieldSpec::text(RESPONSAVEL, "Responsável pela Aplicação"));
            }
            None => {}
        }
        fields
    }

    fn state(&self) -> &FormState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    fn display_value(&self, field: &FieldSpec) -> String {
        if field.kind == FieldKind::Computed {
            if let Some(i) = field
                .key
                .strip_prefix("produto_total_")
                .and_then(|n| n.parse::<usize>().ok())
            {
                return format!("{:.2}", self.dose_total(i));
            }
        }
        self.state.value(&field.key).to_string()
    }
}

// ---------------------------------------------------------------------------
// Expense form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExpenseForm {
    state: FormState,
}

impl ExpenseForm {
    pub fn new(prior: Option<&Expense>, today: NaiveDate) -> Self {
        let mut state = FormState::new(false);
        match prior {
            Some(e) => {
                state.set(DESCRICAO, e.descricao.clone());
                state.set(VALOR, format!("{:.2}", e.valor));
                state.set(CATEGORIA, e.categoria.label());
                state.set(DATA, e.data.format("%Y-%m-%d").to_string());
            }
            None => {
                state.set(CATEGORIA, ExpenseCategory::Produtos.label());
                state.set(DATA, today.format("%Y-%m-%d").to_string());
            }
        }
        Self { state }
    }

    #[cfg(test)]
    pub fn set_value(&mut self, key: &str, value: &str) {
        self.state.set(key, value);
    }

    pub fn assemble(&self) -> Result<Expense, FieldErrors> {
        let mut errors = FieldErrors::new();
        let state = &self.state;
        let valor = read_number(state, VALOR, 0.0, &mut errors);
        let categoria = ExpenseCategory::from_label(state.value(CATEGORIA)).unwrap_or(ExpenseCategory::Outros);
        let data = match NaiveDate::parse_from_str(state.value(DATA).trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.insert(DATA.to_string(), "Data inválida (use AAAA-MM-DD)".to_string());
                None
            }
        };
        match data {
            Some(data) if errors.is_empty() => Ok(Expense {
                descricao: state.value(DESCRICAO).trim().to_string(),
                valor,
                categoria,
                data,
            }),
            _ => Err(errors),
        }
    }
}

impl Form for ExpenseForm {
    fn layout(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::text(DESCRICAO, "Descrição do Gasto"),
            FieldSpec::number(VALOR, "Valor do Gasto"),
            FieldSpec::select(
                CATEGORIA,
                "Categoria",
                EXPENSE_CATEGORIES.iter().map(|c| c.label().to_string()).collect(),
            ),
            FieldSpec::new(DATA, "Data do Gasto", FieldKind::Date),
        ]
    }

    fn state(&self) -> &FormState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }
}
