//! Windows node bootstrap user data

use crate::error::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use eksforge_core::TemplateProcessor;
use serde_json::json;

/// Arguments passed to `Start-EKSBootstrap.ps1`
pub const DEFAULT_BOOTSTRAP_ARGUMENTS: &str = "-ContainerRuntime containerd";

const POWERSHELL_TEMPLATE: &str = r#"<powershell>
[string]$EKSBinDir = "$env:ProgramFiles\Amazon\EKS"
[string]$EKSBootstrapScriptName = 'Start-EKSBootstrap.ps1'
[string]$EKSBootstrapScriptFile = "$EKSBinDir\$EKSBootstrapScriptName"
[string]$cfn_signal = "$env:ProgramFiles\Amazon\cfn-bootstrap\cfn-signal.exe"
& $EKSBootstrapScriptFile -EKSClusterName {{ cluster_name }} {{ bootstrap_arguments }} 3>&1 4>&1 5>&1 6>&1
$LastError = if ($?) { 0 } else { $Error[0].Exception.HResult }
& $cfn_signal --exit-code=$LastError `
  --resource="NodeGroup" `
  --region={{ aws_region }}
</powershell>"#;

/// PowerShell script that joins a Windows instance to the cluster
#[derive(Debug, Clone)]
pub struct BootstrapScript {
    region: String,
    arguments: String,
}

impl BootstrapScript {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            arguments: DEFAULT_BOOTSTRAP_ARGUMENTS.to_string(),
        }
    }

    /// Script text for a cluster
    pub fn render(&self, cluster_name: &str) -> Result<String> {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("cluster_name", json!(cluster_name));
        processor.add_variable("bootstrap_arguments", json!(self.arguments));
        processor.add_variable("aws_region", json!(self.region));
        Ok(processor.render_str(POWERSHELL_TEMPLATE)?)
    }

    /// Base64 user data for a launch template
    pub fn user_data(&self, cluster_name: &str) -> Result<String> {
        Ok(STANDARD.encode(self.render(cluster_name)?))
    }
}
