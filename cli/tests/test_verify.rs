use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{
    compute, mock_get, mock_not_found, network, parse_json_lines, provisioned_resources, TestCli,
};

#[test]
fn test_verify_passes() {
    let cli = TestCli::get();
    let _mocks: Vec<_> = provisioned_resources()
        .iter()
        .map(|(path, body)| mock_get(path, body))
        .collect();

    let checks = parse_json_lines(&cli.run(["--output", "json", "verify"]));

    assert_eq!(checks.len(), 15);
    assert!(checks.iter().all(|check| check["passed"] == json!(true)));
    assert_eq!(
        checks.last().unwrap()["description"],
        json!("scriptVM is attached to scriptNic")
    );
}

#[test]
fn test_verify_table() {
    let cli = TestCli::get();
    let _mocks: Vec<_> = provisioned_resources()
        .iter()
        .map(|(path, body)| mock_get(path, body))
        .collect();

    let output = cli.run(["verify"]);
    assert!(output.contains("virtual machine scriptVM exists"), "{output}");
    assert!(!output.contains("FAILED"), "{output}");
}

#[test]
fn test_verify_fails_for_missing_resource() {
    let cli = TestCli::get();
    let vm = compute("virtualMachines/scriptVM");
    let mut mocks: Vec<_> = provisioned_resources()
        .iter()
        .filter(|(path, _)| *path != vm)
        .map(|(path, body)| mock_get(path, body))
        .collect();
    mocks.push(mock_not_found(&vm));

    let error = cli.run_and_error(["verify"]);
    assert!(error.contains("1 of 13 checks failed."), "{error}");
}

#[test]
fn test_verify_fails_for_detached_interface() {
    let cli = TestCli::get();
    let vm = compute("virtualMachines/scriptVM");
    let mut mocks = Vec::new();
    for (path, mut body) in provisioned_resources() {
        if path == vm {
            body["properties"]["networkProfile"]["networkInterfaces"] =
                json!([{"id": network("networkInterfaces/otherNic")}]);
        }
        mocks.push(mock_get(&path, &body));
    }

    let output = cli.command().args(["--output", "json", "verify"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let failed: Vec<_> = parse_json_lines(&String::from_utf8(output.stdout).unwrap())
        .into_iter()
        .filter(|check| check["passed"] == json!(false))
        .map(|check| check["description"].clone())
        .collect();
    assert_eq!(failed, vec![json!("scriptVM is attached to scriptNic")]);
}
