use serde::{Deserialize, Serialize};

use crate::models::{OperationRecord, OperationType};
use crate::validation::FieldErrors;

pub const PAGES: [Page; 5] = [
    Page::Register,
    Page::Editor,
    Page::Export,
    Page::Finance,
    Page::Charts,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Register,
    Editor,
    Export,
    Finance,
    Charts,
}

impl Page {
    pub fn label(self) -> &'static str {
        match self {
            Page::Register => "Registro de operações",
            Page::Editor => "Editor operacional",
            Page::Export => "Exportar Excel",
            Page::Finance => "Financeiro",
            Page::Charts => "Gráficos",
        }
    }

    pub fn index(self) -> usize {
        PAGES.iter().position(|p| *p == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinanceTab {
    #[default]
    RegisterExpense,
    EditExpenses,
}

impl FinanceTab {
    pub fn label(self) -> &'static str {
        match self {
            FinanceTab::RegisterExpense => "Registrar Novo Gasto",
            FinanceTab::EditExpenses => "Editar Registro",
        }
    }
}

/// The record currently loaded into the register form: its list position at
/// the time editing started plus a snapshot of its contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingRef {
    pub index: usize,
    pub record: OperationRecord,
}

/// Session state. Lives for one dashboard run and is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub page: Page,
    pub finance_tab: FinanceTab,
    pub editing: Option<EditingRef>,
    pub last_operation_type: Option<OperationType>,
    pub errors: FieldErrors,
}

impl AppState {
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }
}
