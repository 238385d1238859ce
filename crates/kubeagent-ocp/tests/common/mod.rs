#![allow(dead_code)]

use kubeagent::exec::{CommandExecutor, ExecutorConfig};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const NAMESPACES: &str = "\
NAME                STATUS   AGE
default             Active   41d
openshift-dns       Active   41d
shop                Active   3d
";

/// A fake `oc` serving a small, fixed cluster. Every invocation is appended
/// to `oc.log` next to the script.
const FAKE_OC: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/oc.log"
case "$*" in
  "get namespaces")
    printf 'NAME                STATUS   AGE\ndefault             Active   41d\nopenshift-dns       Active   41d\nshop                Active   3d\n' ;;
  "get pods -A -o name")
    printf 'pod/dns-default-4xk2p\npod/node-resolver-8q6mz\npod/cart-7d9f\npod/web-1\n' ;;
  "get pods -n openshift-dns -o name")
    printf 'pod/dns-default-4xk2p\npod/node-resolver-8q6mz\n' ;;
  "get pods -n shop -o name")
    printf 'pod/cart-7d9f\npod/web-1\n' ;;
  "get pods -n default -o name"|"get deployments -n default -o name")
    ;;
  "get deployments -A -o name")
    printf 'deployment.apps/dns-operator\ndeployment.apps/cart\n' ;;
  "get deployments -n shop -o name")
    printf 'deployment.apps/cart\n' ;;
  "get deployments -n openshift-dns -o name")
    printf 'deployment.apps/dns-operator\n' ;;
  "get pods -A --field-selector status.phase!=Running -o custom-columns=NAMESPACE:.metadata.namespace,NAME:.metadata.name")
    printf 'NAMESPACE   NAME\nshop        cart-7d9f\n' ;;
  "get deployment -n shop cart -o yaml")
    printf 'apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: cart\n' ;;
  "get pod -n shop web-1 -o jsonpath={.status}")
    printf '{"phase":"Pending"}\n' ;;
  *)
    echo "error: the server doesn't have a resource type \"$2\"" >&2
    exit 1 ;;
esac
"#;

/// A fake `kube-health`: two report lines for `deployment/cart`, one line
/// for anything else.
const FAKE_KUBE_HEALTH: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/kube-health.log"
case "$*" in
  "-n shop -H deployment/cart"|"-H deployment/cart")
    printf 'OBJECT           CONDITION   STATUS\ndeployment/cart  Available   False\n' ;;
  *)
    echo "no object found" ;;
esac
"#;

/// A fake `yq` that tags every input line.
const FAKE_YQ: &str = "#!/bin/sh\nsed 's/^/yaml: /'\n";

/// A temporary bin directory with fake cluster programs.
pub struct FakeCluster {
    dir: TempDir,
}

impl FakeCluster {
    /// `oc`, `kube-health` and `yq` installed.
    pub fn new() -> Self {
        let cluster = Self::empty();
        cluster.install("oc", FAKE_OC);
        cluster.install("kube-health", FAKE_KUBE_HEALTH);
        cluster.install("yq", FAKE_YQ);
        cluster
    }

    /// No programs installed.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn install(&self, name: &str, script: &str) {
        let path = self.dir.path().join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn executor(&self) -> Arc<CommandExecutor> {
        Arc::new(CommandExecutor::new(
            ExecutorConfig::default()
                .with_bin_dir(Some(self.bin_dir()))
                .with_timeout(Duration::from_secs(10)),
        ))
    }

    /// Argument lines `program` was invoked with.
    pub fn invocations(&self, program: &str) -> Vec<String> {
        fs::read_to_string(self.dir.path().join(format!("{program}.log")))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
