use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const STACK_KDL: &str = r#"
region "us-east-1"
account-id "210987654321"
vpc "demo" {
    cidr-block "10.0.0.0/16"
    private-subnet "10.0.1.0/24" az="us-east-1a"
    private-subnet "10.0.2.0/24" az="us-east-1b"
    public-subnet "10.0.101.0/24" az="us-east-1a"
    nat-gateway-per-az #false
    tags {
        Environment "test"
    }
}
eks "demo" {
    version "1.24"
    linux-nodegroup "general" {
        instance-type "t3.large"
        ami-type "AL2_x86_64"
        disk-size 20
        desired-size 1
        min-size 1
        max-size 2
        ssh-key "ops"
    }
}
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// A project with a valid `stack.kdl`
    pub fn with_stack() -> Self {
        let project = Self::new();
        project.write_stack_kdl(STACK_KDL);
        project
    }

    pub fn write_stack_kdl(&self, content: &str) {
        fs::write(self.root.path().join("stack.kdl"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.path().join(".eksforge").join("state.json")
    }
}
