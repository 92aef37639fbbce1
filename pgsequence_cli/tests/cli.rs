mod cli {
    use assert_cmd::prelude::*;
    use predicates::str::contains;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn scripts_dir(files: &[(&str, &str)]) -> TempDir {
        let tmp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp_dir.path().join(name), content).unwrap();
        }
        tmp_dir
    }

    const CREATE_ORDERS: &str = r#"
[[commands]]
verb = "create_sequence"
name = "order_id_seq"
start = 1000
cache = 10
"#;

    const ALTER_ORDERS: &str = r#"
[[commands]]
verb = "alter_sequence"
name = "order_id_seq"
increment_by = 5
"#;

    // `pgsequence` with no args should exit with a non-zero code.
    #[test]
    fn cli_no_args() {
        Command::cargo_bin("pgsequence").unwrap().assert().failure();
    }

    #[test]
    fn cli_version() {
        Command::cargo_bin("pgsequence")
            .unwrap()
            .args(["-V"])
            .assert()
            .stdout(contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn show_sql_prints_statements() {
        let dir = scripts_dir(&[("1_create_orders.toml", CREATE_ORDERS)]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .arg("-M")
            .arg(dir.path())
            .arg("show-sql")
            .assert()
            .success()
            .stdout(contains(
                "CREATE SEQUENCE \"order_id_seq\" INCREMENT BY 1 NO MINVALUE NO MAXVALUE START WITH 1000 CACHE 10 NO CYCLE;",
            ));
    }

    #[test]
    fn show_sql_revert_inverts_create() {
        let dir = scripts_dir(&[("1_create_orders.toml", CREATE_ORDERS)]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .arg("-M")
            .arg(dir.path())
            .args(["show-sql", "--revert"])
            .assert()
            .success()
            .stdout(contains("DROP SEQUENCE \"order_id_seq\" RESTRICT;"));
    }

    #[test]
    fn show_sql_revert_fails_on_alter() {
        let dir = scripts_dir(&[
            ("1_create_orders.toml", CREATE_ORDERS),
            ("2_alter_orders.toml", ALTER_ORDERS),
        ]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .arg("-M")
            .arg(dir.path())
            .args(["show-sql", "--revert"])
            .assert()
            .failure()
            .stderr(contains("irreversible"));
    }

    #[test]
    fn show_scripts_lists_versions() {
        let dir = scripts_dir(&[
            ("1_create_orders.toml", CREATE_ORDERS),
            ("2_alter_orders.toml", ALTER_ORDERS),
        ]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .arg("-M")
            .arg(dir.path())
            .arg("show-scripts")
            .assert()
            .success()
            .stdout(contains("create_orders"))
            .stdout(contains("alter_orders"));
    }

    #[test]
    fn invalid_script_is_reported() {
        let dir = scripts_dir(&[(
            "1_broken.toml",
            "[[commands]]\nverb = \"rename_sequence\"\nname = \"s\"\n",
        )]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .arg("-M")
            .arg(dir.path())
            .arg("show-sql")
            .assert()
            .failure();
    }

    // `pgsequence migrate` without a database URL should exit with a non-zero code.
    #[test]
    fn migrate_without_db_url() {
        let dir = scripts_dir(&[("1_create_orders.toml", CREATE_ORDERS)]);
        Command::cargo_bin("pgsequence")
            .unwrap()
            .env_remove("PGSEQUENCE_DB_URL")
            .env_remove("PGSEQUENCE_CONFIG")
            .arg("-M")
            .arg(dir.path())
            .arg("migrate")
            .assert()
            .failure()
            .stderr(contains("missing database URL"));
    }
}
