//! Page state transitions. Every action reloads the store it touches,
//! mutates the in-memory list and writes the whole file back, leaving
//! entries it could not read where they were.

use crate::models::{Expense, Operation, OperationRecord, OperationType, Status};
use crate::state::{AppState, EditingRef, FinanceTab, Page};
use crate::store::{Contents, Stores};
use crate::validation::validate_record;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectPage(Page),
    StartEdit { index: usize, record: OperationRecord },
    CancelEdit,
    RememberOperationType(Option<OperationType>),
    SubmitRecord(OperationRecord),
    FinalizeRecord { index: usize, record: OperationRecord },
    DeleteRecord { index: usize, record: OperationRecord },
    SelectFinanceTab(FinanceTab),
    SubmitExpense(Expense),
    UpdateExpense {
        index: usize,
        original: Expense,
        updated: Expense,
    },
    DeleteExpense { index: usize, expense: Expense },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub state: AppState,
    pub notice: Option<Notice>,
}

impl Outcome {
    fn quiet(state: AppState) -> Self {
        Self { state, notice: None }
    }

    fn with(state: AppState, notice: Notice) -> Self {
        Self {
            state,
            notice: Some(notice),
        }
    }
}

/// Find `target` in `items`, preferring the remembered position. Falls back
/// to the first equal entry when the list shifted underneath.
pub fn locate<T: PartialEq>(items: &[T], index: usize, target: &T) -> Option<usize> {
    if items.get(index) == Some(target) {
        return Some(index);
    }
    items.iter().position(|item| item == target)
}

const NOT_FOUND: &str = "Registro não encontrado. Atualize a lista e tente novamente.";

pub fn apply(mut state: AppState, action: Action, stores: &Stores) -> Outcome {
    match action {
        Action::SelectPage(page) => {
            if page != state.page {
                state.errors.clear();
            }
            state.page = page;
            Outcome::quiet(state)
        }
        Action::StartEdit { index, record } => {
            state.last_operation_type = record.operation_type().or(state.last_operation_type);
            state.editing = Some(EditingRef { index, record });
            state.errors.clear();
            state.page = Page::Register;
            Outcome::quiet(state)
        }
        Action::CancelEdit => {
            state.editing = None;
            state.errors.clear();
            Outcome::quiet(state)
        }
        Action::RememberOperationType(op_type) => {
            state.last_operation_type = op_type;
            Outcome::quiet(state)
        }
        Action::SubmitRecord(record) => submit_record(state, record, stores),
        Action::FinalizeRecord { index, record } => finalize_record(state, index, &record, stores),
        Action::DeleteRecord { index, record } => delete_record(state, index, &record, stores),
        Action::SelectFinanceTab(tab) => {
            state.finance_tab = tab;
            Outcome::quiet(state)
        }
        Action::SubmitExpense(expense) => {
            let mut expenses = stores.expenses.contents();
            tracing::info!(descricao = %expense.descricao, valor = expense.valor, "expense created");
            expenses.push(expense);
            save_expenses(state, &expenses, stores, "Gasto registrado com sucesso!")
        }
        Action::UpdateExpense {
            index,
            original,
            updated,
        } => {
            let mut expenses = stores.expenses.contents();
            let Some(pos) = locate(expenses.items(), index, &original) else {
                return Outcome::with(state, Notice::Error(NOT_FOUND.into()));
            };
            expenses[pos] = updated;
            tracing::info!(position = pos, "expense updated");
            save_expenses(state, &expenses, stores, "Gasto atualizado com sucesso!")
        }
        Action::DeleteExpense { index, expense } => {
            let mut expenses = stores.expenses.contents();
            let Some(pos) = locate(expenses.items(), index, &expense) else {
                return Outcome::with(state, Notice::Error(NOT_FOUND.into()));
            };
            expenses.remove(pos);
            tracing::info!(position = pos, "expense deleted");
            save_expenses(state, &expenses, stores, "Gasto excluído com sucesso!")
        }
    }
}

fn submit_record(mut state: AppState, record: OperationRecord, stores: &Stores) -> Outcome {
    let errors = validate_record(&record);
    if !errors.is_empty() {
        tracing::debug!(fields = errors.len(), "record rejected by validation");
        state.errors = errors;
        return Outcome::quiet(state);
    }

    state.last_operation_type = record.operation_type().or(state.last_operation_type);
    let mut records = stores.records.contents();
    let editing = state.editing.take();
    let success = match &editing {
        Some(edit) => {
            let Some(pos) = locate(records.items(), edit.index, &edit.record) else {
                tracing::warn!(index = edit.index, "edited record no longer in store");
                state.errors.clear();
                state.page = Page::Editor;
                return Outcome::with(state, Notice::Error(NOT_FOUND.into()));
            };
            records[pos] = record;
            tracing::info!(position = pos, "record replaced");
            "Registro editado com sucesso!"
        }
        None => {
            tracing::info!(tipo = record.type_label(), "record created");
            records.push(record);
            "Registro criado com sucesso!"
        }
    };

    state.errors.clear();
    state.page = Page::Editor;
    save_records(state, &records, stores, success)
}

fn finalize_record(
    state: AppState,
    index: usize,
    record: &OperationRecord,
    stores: &Stores,
) -> Outcome {
    let mut records = stores.records.contents();
    let Some(pos) = locate(records.items(), index, record) else {
        return Outcome::with(state, Notice::Error(NOT_FOUND.into()));
    };
    match &mut records[pos].operation {
        Operation::Aerial(op) if op.status == Status::Open => {
            op.status = Status::Finished;
        }
        _ => {
            return Outcome::with(
                state,
                Notice::Info("Somente operações aéreas em aberto podem ser finalizadas.".into()),
            );
        }
    }
    tracing::info!(position = pos, "record finalized");
    save_records(state, &records, stores, "Registro finalizado com sucesso!")
}

fn delete_record(
    mut state: AppState,
    index: usize,
    record: &OperationRecord,
    stores: &Stores,
) -> Outcome {
    let mut records = stores.records.contents();
    let Some(pos) = locate(records.items(), index, record) else {
        return Outcome::with(state, Notice::Error(NOT_FOUND.into()));
    };
    records.remove(pos);
    tracing::info!(position = pos, "record deleted");
    if state
        .editing
        .as_ref()
        .is_some_and(|edit| edit.index == pos && &edit.record == record)
    {
        state.editing = None;
    }
    save_records(state, &records, stores, "Registro excluído com sucesso!")
}

fn save_records(
    state: AppState,
    records: &Contents<OperationRecord>,
    stores: &Stores,
    success: &str,
) -> Outcome {
    match stores.records.save_contents(records) {
        Ok(()) => Outcome::with(state, Notice::Success(success.to_string())),
        Err(e) => {
            tracing::error!("failed to save records: {e}");
            Outcome::with(state, Notice::Error(format!("Erro ao salvar registros: {e}")))
        }
    }
}

fn save_expenses(
    state: AppState,
    expenses: &Contents<Expense>,
    stores: &Stores,
    success: &str,
) -> Outcome {
    match stores.expenses.save_contents(expenses) {
        Ok(()) => Outcome::with(state, Notice::Success(success.to_string())),
        Err(e) => {
            tracing::error!("failed to save expenses: {e}");
            Outcome::with(state, Notice::Error(format!("Erro ao salvar gastos: {e}")))
        }
    }
}
