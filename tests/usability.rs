// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

/// Usability tests
///
/// The purpose of these tests is to ensure that running the binary with invalid arguments or
/// missing files (i.e., missing configuration files) results in a failing exit status and a useful
/// error message.

#[cfg(test)]
mod tests {
    use crmconf_lib::test_env::test_path;

    #[test]
    fn missing_config() {
        let invalid_config = "this_file_does_not_exist";
        let result = std::process::Command::new(env!("CARGO_BIN_EXE_crmconf"))
            .args(vec!["--config", invalid_config])
            .output()
            .unwrap();

        assert!(!result.status.success());
        let err_message = String::from_utf8(result.stderr).unwrap();
        assert!(err_message.contains(invalid_config));
    }

    #[test]
    fn unknown_agent_parameter() {
        let config = test_path("fixtures/crmconf.conf");
        let result = std::process::Command::new(env!("CARGO_BIN_EXE_crmconf"))
            .args(vec!["--config", &config, "check-param", "IPaddr2", "no_such_param", "x"])
            .args(vec!["--provider", "heartbeat"])
            .output()
            .unwrap();

        assert!(!result.status.success());
        let err_message = String::from_utf8(result.stderr).unwrap();
        assert!(err_message.contains("no_such_param"));
    }

    #[test]
    fn check_param() {
        let config = test_path("fixtures/crmconf.conf");
        let run = |value: &str| {
            std::process::Command::new(env!("CARGO_BIN_EXE_crmconf"))
                .args(vec!["--config", &config, "check-param", "--provider", "heartbeat"])
                .args(vec!["IPaddr2", "cidr_netmask", value])
                .output()
                .unwrap()
        };

        let good = run("24");
        assert!(good.status.success());
        assert_eq!(String::from_utf8(good.stdout).unwrap().trim(), "ok");

        assert!(!run("twenty-four").status.success());
    }

    #[test]
    fn show() {
        let config = test_path("fixtures/crmconf.conf");
        let result = std::process::Command::new(env!("CARGO_BIN_EXE_crmconf"))
            .args(vec!["--config", &config, "show", "--constraints"])
            .output()
            .unwrap();

        assert!(result.status.success());
        let out = String::from_utf8(result.stdout).unwrap();
        assert!(out.contains("node1: online DC"));
        assert!(out.contains("colocation col-ip"));
    }
}
