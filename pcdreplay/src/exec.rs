//! Lancement hors-bande de tcpreplay sur une séquence de captures

use std::path::PathBuf;
use tokio::process::Command;
use tracing::{error, info};

/// Erreurs de délégation du rejeu
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Replay tool is not available")]
    ToolUnavailable,

    #[error("Nothing to replay")]
    EmptyPlan,
}

/// Une invocation de tcpreplay : un fichier et ses réglages effectifs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    pub file: PathBuf,
    pub interface: String,
    pub topspeed: bool,
    pub loop_forever: bool,
}

impl ReplayStep {
    /// Arguments de ligne de commande pour cette étape.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![format!("--intf1={}", self.interface)];
        if self.topspeed {
            args.push("--topspeed".to_string());
        }
        if self.loop_forever {
            // tcpreplay : --loop=0 signifie rejouer indéfiniment
            args.push("--loop=0".to_string());
        }
        args.push(self.file.to_string_lossy().to_string());
        args
    }
}

/// Lance le rejeu d'une séquence d'étapes, hors-bande.
///
/// Les étapes sont exécutées séquentiellement dans une tâche détachée ; la
/// fonction retourne dès que le plan est validé. Les échecs individuels sont
/// journalisés, jamais remontés au cœur.
pub fn spawn_replay(
    tool_path: String,
    tool_available: bool,
    steps: Vec<ReplayStep>,
) -> Result<(), ReplayError> {
    if !tool_available {
        return Err(ReplayError::ToolUnavailable);
    }
    if steps.is_empty() {
        return Err(ReplayError::EmptyPlan);
    }

    tokio::spawn(async move {
        for step in steps {
            info!(file = %step.file.display(), interface = %step.interface, "Replaying capture");
            match Command::new(&tool_path).args(step.args()).output().await {
                Ok(output) if output.status.success() => {
                    info!(file = %step.file.display(), "Replay finished");
                }
                Ok(output) => {
                    error!(
                        file = %step.file.display(),
                        status = %output.status,
                        "tcpreplay exited with an error"
                    );
                }
                Err(e) => {
                    error!(file = %step.file.display(), error = %e, "Failed to run tcpreplay");
                }
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_args_follow_settings() {
        let step = ReplayStep {
            file: PathBuf::from("/captures/abc.pcap"),
            interface: "eth0".to_string(),
            topspeed: false,
            loop_forever: false,
        };
        assert_eq!(step.args(), vec!["--intf1=eth0", "/captures/abc.pcap"]);

        let step = ReplayStep {
            topspeed: true,
            loop_forever: true,
            ..step
        };
        assert_eq!(
            step.args(),
            vec!["--intf1=eth0", "--topspeed", "--loop=0", "/captures/abc.pcap"]
        );
    }

    #[tokio::test]
    async fn spawn_replay_rejects_unavailable_tool() {
        let steps = vec![ReplayStep {
            file: PathBuf::from("/captures/abc.pcap"),
            interface: "eth0".to_string(),
            topspeed: false,
            loop_forever: false,
        }];
        assert!(matches!(
            spawn_replay("/usr/bin/tcpreplay".into(), false, steps),
            Err(ReplayError::ToolUnavailable)
        ));
        assert!(matches!(
            spawn_replay("/usr/bin/tcpreplay".into(), true, Vec::new()),
            Err(ReplayError::EmptyPlan)
        ));
    }
}
