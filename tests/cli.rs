use std::path::Path;

use assert_cmd::Command;
use calamine::{open_workbook, Data, Reader, Xlsx};
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated home (for the settings file) and data directory.
struct Env {
    home: TempDir,
    data: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
            data: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("caetano").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .arg("--data-dir")
            .arg(self.data.path());
        cmd
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.data.path().join(name)
    }

    fn seed_records(&self, json: &str) {
        std::fs::write(self.path("registros.json"), json).unwrap();
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

const SEEDED: &str = r#"[
    {"mes": "Março", "ano": 2024, "tipo_operacao": "Operação Aérea",
     "nome_fazenda": "Santa Rita", "talhao_aplicado": "T1", "hectares_totais": 10,
     "cultura": "Soja", "velocidade": 180, "altura": 3, "status": "Em aberto",
     "produtos": [{"nome": "X", "dose_por_hectare": 2, "dose_total": 20.0}],
     "aeronave": "PT-ABC", "responsavel": "Ana"},
    {"mes": "Abril", "ano": 2024, "tipo_operacao": "Operação Terrestre",
     "nome_fazenda": "Boa Vista", "talhao_aplicado": "T7", "hectares_totais": 30,
     "cultura": "Milho", "trator": "MF 4275", "implemento": "Barra",
     "num_produtos_terrestre": 1,
     "produtos": [{"nome_produto": "Glifosato", "dose": 1.5}],
     "observacao": "", "responsavel": "Rui"}
]"#;

#[test]
fn test_init_creates_empty_stores() {
    let env = Env::new();
    env.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("registros.json"))
        .stdout(predicate::str::contains("gastos.json"));

    assert_eq!(read(&env.path("registros.json")).trim(), "[]");
    assert_eq!(read(&env.path("gastos.json")).trim(), "[]");
    assert!(env.path("exports").is_dir());
    assert!(env.home.path().join(".config/caetano/settings.json").exists());
}

#[test]
fn test_init_keeps_existing_stores() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd().arg("init").assert().success();
    assert!(read(&env.path("registros.json")).contains("Santa Rita"));
}

#[test]
fn test_expense_add_list_delete() {
    let env = Env::new();
    env.cmd()
        .args([
            "expenses",
            "add",
            "--description",
            "Diesel",
            "--amount",
            "350,5",
            "--category",
            "Combustível",
            "--date",
            "2024-05-10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gasto registrado com sucesso!"));

    let stored = read(&env.path("gastos.json"));
    assert!(stored.contains("\"data\": \"2024-05-10\""));
    assert!(stored.contains("\"categoria\": \"Combustível\""));

    env.cmd()
        .args(["expenses", "list", "--year", "2024", "--month", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diesel"))
        .stdout(predicate::str::contains("R$ 350.50"));

    env.cmd()
        .args(["expenses", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gasto excluído com sucesso!"));

    env.cmd()
        .args(["expenses", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nenhum gasto registrado."));
}

#[test]
fn test_expense_rejects_bad_category_and_amount() {
    let env = Env::new();
    env.cmd()
        .args(["expenses", "add", "--description", "x", "--amount", "10", "--category", "Lazer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Categoria inválida"));

    env.cmd()
        .args(["expenses", "add", "--description", "x", "--amount=-3", "--category", "Outros"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valor inválido"));
    assert!(!env.path("gastos.json").exists());
}

#[test]
fn test_records_list_filters_by_month() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .args(["records", "list", "--month", "Março"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Santa Rita"))
        .stdout(predicate::str::contains("Boa Vista").not());

    env.cmd()
        .args(["records", "list", "--year", "1999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nenhum registro encontrado."));
}

#[test]
fn test_records_list_rejects_bad_month() {
    let env = Env::new();
    env.cmd()
        .args(["records", "list", "--month", "13"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mês inválido"));
}

#[test]
fn test_finalize_only_open_aerial() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .args(["records", "finalize", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registro finalizado com sucesso!"));
    assert!(read(&env.path("registros.json")).contains("\"status\": \"Finalizado\""));

    env.cmd()
        .args(["records", "finalize", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Somente operações aéreas em aberto"));
}

#[test]
fn test_delete_record() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd().args(["records", "delete", "1"]).assert().success();
    let stored = read(&env.path("registros.json"));
    assert!(!stored.contains("Santa Rita"));
    assert!(stored.contains("Boa Vista"));

    env.cmd()
        .args(["records", "delete", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_export_xlsx_readable() {
    let env = Env::new();
    env.seed_records(SEEDED);
    let out = env.path("out.xlsx");
    env.cmd()
        .args(["export", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 operations"));

    let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("Mês".into())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("Março".into())));
    assert_eq!(range.get_value((1, 3)), Some(&Data::String("Santa Rita".into())));
    // Staging file is gone
    assert!(!env.path("operacoes_exportadas.xlsx").exists());
}

#[test]
fn test_export_csv_to_stdout() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .args(["export", "--format", "csv", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Mês,Ano,Tipo de Operação"))
        .stdout(predicate::str::contains("Glifosato"))
        .stdout(predicate::str::contains("Wrote").not());
}

#[test]
fn test_export_empty_store() {
    let env = Env::new();
    env.cmd()
        .arg("export")
        .assert()
        .success()
        .stderr(predicate::str::contains("Nenhum registro para exportação"));
    assert!(!env.path("exports/operacoes_exportadas.xlsx").exists());
}

#[test]
fn test_charts_empty_period() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .args(["charts", "--year", "2024", "--month", "Março"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nenhum gasto registrado para o mês e ano selecionados.",
        ))
        .stdout(predicate::str::contains("Hectares Realizados em Março/2024"))
        .stdout(predicate::str::contains("10.00 ha"));

    env.cmd()
        .args(["charts", "--year", "2024", "--month", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Nenhum registro de operação para o mês e ano selecionados.",
        ));
}

#[test]
fn test_status_counts() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("FAZENDA SÃO CAETANO"))
        .stdout(predicate::str::contains("Operations:        2"))
        .stdout(predicate::str::contains("Open aerial:       1"));
}

#[test]
fn test_backup_copies_stores() {
    let env = Env::new();
    env.seed_records(SEEDED);
    env.cmd()
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup saved to"));

    let backups: Vec<_> = std::fs::read_dir(env.path("backups"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].join("registros.json").exists());
    assert!(!backups[0].join("gastos.json").exists());
}

#[test]
fn test_backup_without_stores_fails() {
    let env = Env::new();
    env.cmd().arg("backup").assert().failure();
}

#[test]
fn test_load_requires_stores() {
    let env = Env::new();
    env.cmd()
        .arg("load")
        .arg(env.data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("registros.json"));

    env.seed_records("[]");
    env.cmd()
        .arg("load")
        .arg(env.data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to"));
}

#[test]
fn test_completions() {
    let env = Env::new();
    env.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("caetano"));
}
