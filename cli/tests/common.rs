use mockito::{mock, server_url, Matcher, Mock};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

pub const SUBSCRIPTION: &str = "sub";
pub const GROUP: &str = "/subscriptions/sub/resourceGroups/scriptGroup";

pub struct TestCli {
    cli_path: PathBuf,
    missing_config: PathBuf,
}

impl TestCli {
    pub fn get() -> &'static Self {
        static TEST_CLI: Lazy<TestCli> = Lazy::new(|| TestCli {
            cli_path: PathBuf::from(env!("CARGO_BIN_EXE_vmprov")),
            missing_config: Path::new(env!("CARGO_TARGET_TMPDIR")).join("vmprov-missing.json"),
        });

        &TEST_CLI
    }

    /// A command isolated from the user's configuration and environment, but with no connection
    /// settings.
    pub fn bare_command(&self) -> Command {
        self.command_with_config(&self.missing_config)
    }

    pub fn command_with_config(&self, config: &Path) -> Command {
        let mut command = Command::new(&self.cli_path);
        command
            .env_remove("AZURE_SUBSCRIPTION_ID")
            .env_remove("AZURE_ACCESS_TOKEN")
            .env_remove("RUST_LOG")
            .arg("--config-file")
            .arg(config);
        command
    }

    /// A command talking to the mock server.
    pub fn command(&self) -> Command {
        let mut command = self.bare_command();
        command
            .arg("--endpoint")
            .arg(server_url())
            .arg("--token")
            .arg("secret")
            .arg("--subscription")
            .arg(SUBSCRIPTION)
            .arg("--poll-interval")
            .arg("0");
        command
    }

    pub fn run(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        self.output(self.command().args(args))
    }

    pub fn run_and_error(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        self.output_error(self.command().args(args))
    }

    pub fn output(&self, command: &mut Command) -> String {
        let output = command.output().unwrap();

        if !output.status.success() {
            panic!(
                "failed to run command:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        String::from_utf8(output.stdout).unwrap()
    }

    pub fn output_error(&self, command: &mut Command) -> String {
        let output = command.output().unwrap();

        if output.status.success() {
            panic!(
                "succeeded running command (expected failure):\n{}",
                String::from_utf8_lossy(&output.stdout)
            );
        }
        assert_eq!(output.status.code(), Some(1));

        String::from_utf8(output.stderr).unwrap()
    }
}

pub fn parse_json_lines(output: &str) -> Vec<Value> {
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Match a request path regardless of its query string.
pub fn arm_path(path: &str) -> Matcher {
    Matcher::Regex(format!("^{}(\\?|$)", path.replace('.', "\\.")))
}

pub fn network(path: &str) -> String {
    format!("{GROUP}/providers/Microsoft.Network/{path}")
}

pub fn compute(path: &str) -> String {
    format!("{GROUP}/providers/Microsoft.Compute/{path}")
}

fn resource(id: &str, name: &str, mut properties: Value) -> Value {
    properties["provisioningState"] = json!("Succeeded");
    json!({"id": id, "name": name, "location": "westeurope", "properties": properties})
}

/// Every provisioned resource as Azure reports it, keyed by path.
pub fn provisioned_resources() -> Vec<(String, Value)> {
    let vnet = network("virtualNetworks/scriptNet");
    let subnet = network("virtualNetworks/scriptNet/subnets/scriptSnet");
    let pip = network("publicIPAddresses/scriptIp");
    let nic = network("networkInterfaces/scriptNic");
    let vm = compute("virtualMachines/scriptVM");

    vec![
        (GROUP.to_owned(), resource(GROUP, "scriptGroup", json!({}))),
        (
            vnet.clone(),
            resource(
                &vnet,
                "scriptNet",
                json!({"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}, "flowTimeoutInMinutes": 10}),
            ),
        ),
        (
            subnet.clone(),
            resource(&subnet, "scriptSnet", json!({"addressPrefix": "10.0.0.0/16"})),
        ),
        (
            pip.clone(),
            resource(
                &pip,
                "scriptIp",
                json!({
                    "publicIPAllocationMethod": "Static",
                    "publicIPAddressVersion": "IPv4",
                    "ipAddress": "20.31.4.5"
                }),
            ),
        ),
        (
            nic.clone(),
            resource(
                &nic,
                "scriptNic",
                json!({
                    "ipConfigurations": [{
                        "name": "ipconfig1",
                        "properties": {
                            "subnet": {"id": subnet},
                            "publicIPAddress": {"id": pip},
                            "privateIPAddress": "10.0.0.4"
                        }
                    }]
                }),
            ),
        ),
        (
            vm.clone(),
            resource(
                &vm,
                "scriptVM",
                json!({
                    "hardwareProfile": {"vmSize": "Standard_D1_v2"},
                    "networkProfile": {
                        "networkInterfaces": [{"id": nic, "properties": {"primary": true}}]
                    }
                }),
            ),
        ),
    ]
}

pub fn mock_get(path: &str, body: &Value) -> Mock {
    mock("GET", arm_path(path))
        .match_header("authorization", "Bearer secret")
        .with_body(body.to_string())
        .create()
}

pub fn mock_not_found(path: &str) -> Mock {
    mock("GET", arm_path(path))
        .with_status(404)
        .with_body(r#"{"error": {"code": "ResourceNotFound", "message": "The resource was not found."}}"#)
        .create()
}
