//! Integration tests for imod-recipe

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command with an isolated config that disables the audit log
    fn imod_recipe(home: &TempDir) -> Command {
        let config = home.path().join("config.toml");
        std::fs::write(&config, "[general]\naudit_log = false\n").unwrap();

        let mut cmd = cargo_bin_cmd!("imod-recipe");
        cmd.env("IMOD_RECIPE_CONFIG", &config).env("CI", "1");
        cmd
    }

    /// Prefix that looks like a finished install
    fn fake_prefix(root: &Path) {
        let imod = root.join("IMOD");
        std::fs::create_dir_all(&imod).unwrap();
        std::fs::write(
            imod.join("IMOD-linux.sh"),
            "export IMOD_DIR=${IMOD_DIR:=/usr/local/IMOD}\n\
             export PATH=$IMOD_DIR/bin:$PATH\n\
             export IMOD_PLUGIN_DIR=$IMOD_DIR/lib/imodplug\n",
        )
        .unwrap();
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build and activate IMOD"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("imod-recipe 4.11.24"));
    }

    #[test]
    fn info_shows_descriptor() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .arg("info")
            .assert()
            .success()
            .stdout(predicate::str::contains("imod@4.11.24"))
            .stdout(predicate::str::contains(
                "7d128a0f0fda4bbb79bd75823e9242ffb548c9c596a27b3ce92e0dfd790dfaff",
            ))
            .stdout(predicate::str::contains("mesa-glu"));
    }

    #[test]
    fn status_runs() {
        // Dependencies may be missing on the test host; status still succeeds
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependencies:"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[tools]"))
            .stdout(predicate::str::contains("audit_log = false"));
    }

    #[test]
    fn config_set_then_show() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .args(["config", "set", "tools.python", "python3.11"])
            .assert()
            .success();

        imod_recipe_keep(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("python = \"python3.11\""));
    }

    /// Same as `imod_recipe` but keeps the existing config file
    fn imod_recipe_keep(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("imod-recipe");
        cmd.env("IMOD_RECIPE_CONFIG", home.path().join("config.toml"))
            .env("CI", "1");
        cmd
    }

    #[test]
    fn config_set_unknown_key() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn env_missing_prefix_fails() {
        let home = TempDir::new().unwrap();
        imod_recipe(&home)
            .args(["env", "--prefix"])
            .arg(home.path().join("no-such-prefix"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Required file not found"))
            .stderr(predicate::str::contains("IMOD-linux.sh"));
    }

    #[test]
    fn env_prints_exports() {
        let home = TempDir::new().unwrap();
        let prefix = home.path().join("imod");
        fake_prefix(&prefix);

        imod_recipe(&home)
            .args(["env", "--prefix"])
            .arg(&prefix)
            .assert()
            .success()
            .stdout(predicate::str::starts_with(format!(
                "export IMOD_DIR='{}/IMOD';",
                prefix.display()
            )))
            .stdout(predicate::str::contains("IMOD_PLUGIN_DIR"))
            .stdout(predicate::str::contains(format!(
                "export IMOD_CALIB_DIR='{}/ImodCalib';",
                prefix.display()
            )));
    }

    #[test]
    fn env_json_format() {
        let home = TempDir::new().unwrap();
        let prefix = home.path().join("imod");
        fake_prefix(&prefix);

        let output = imod_recipe(&home)
            .args(["env", "--format", "json", "--prefix"])
            .arg(&prefix)
            .output()
            .unwrap();
        assert!(output.status.success());

        let ops: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let ops = ops.as_array().unwrap();
        assert_eq!(ops.first().unwrap()["name"], "IMOD_DIR");
        assert_eq!(ops.last().unwrap()["name"], "IMOD_CALIB_DIR");
        assert_eq!(ops.last().unwrap()["op"], "set");
    }

    #[test]
    fn exec_applies_environment() {
        let home = TempDir::new().unwrap();
        let prefix = home.path().join("imod");
        fake_prefix(&prefix);

        imod_recipe(&home)
            .args(["exec", "--prefix"])
            .arg(&prefix)
            .args(["--", "sh", "-c", "echo $IMOD_CALIB_DIR; echo $PATH"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "{}/ImodCalib",
                prefix.display()
            )))
            .stdout(predicate::str::contains(format!("{}/IMOD/bin", prefix.display())));
    }

    #[test]
    fn exec_propagates_exit_code() {
        let home = TempDir::new().unwrap();
        let prefix = home.path().join("imod");
        fake_prefix(&prefix);

        imod_recipe(&home)
            .args(["exec", "--prefix"])
            .arg(&prefix)
            .args(["--", "sh", "-c", "exit 3"])
            .assert()
            .code(3);
    }

    #[test]
    fn install_rejects_wrong_archive() {
        let home = TempDir::new().unwrap();
        let archive = home.path().join("imod.sh");
        std::fs::write(&archive, "echo not the real installer\n").unwrap();

        imod_recipe(&home)
            .args(["install", "-y", "--skip-dependency-check", "--prefix"])
            .arg(home.path().join("prefix"))
            .arg("--archive")
            .arg(&archive)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Checksum mismatch"));

        assert!(!home.path().join("prefix").join("ImodCalib").exists());
    }

    #[test]
    fn install_into_non_empty_prefix_fails_without_yes() {
        let home = TempDir::new().unwrap();
        let prefix = home.path().join("prefix");
        std::fs::create_dir_all(prefix.join("IMOD")).unwrap();

        imod_recipe(&home)
            .args(["install", "--skip-dependency-check", "--prefix"])
            .arg(&prefix)
            .assert()
            .failure()
            .stderr(predicate::str::contains("install cancelled"))
            .stderr(predicate::str::contains("use -y"));

        assert!(!prefix.join("ImodCalib").exists());
    }

    #[test]
    fn fetch_rejects_wrong_archive() {
        let home = TempDir::new().unwrap();
        let archive = home.path().join("imod.sh");
        std::fs::write(&archive, "truncated").unwrap();

        imod_recipe(&home)
            .args(["fetch", "--archive"])
            .arg(&archive)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Checksum mismatch"));
    }
}
