//! 运行前环境重置
//!
//! 仿真引擎会在多次运行之间残留进程/namespace，需要在每次运行前清理。

use std::process::Command;

use tracing::{debug, info, warn};

/// 运行前的环境重置
pub trait EnvironmentReset {
    fn reset(&mut self);
}

/// 不做任何事（dry-run 与测试使用）
#[derive(Debug, Default)]
pub struct NoopReset;

impl EnvironmentReset for NoopReset {
    fn reset(&mut self) {
        debug!("跳过环境重置");
    }
}

/// 依次执行一组清理命令；失败只记录警告。
#[derive(Debug, Clone)]
pub struct CommandReset {
    pub commands: Vec<Vec<String>>,
}

impl Default for CommandReset {
    fn default() -> Self {
        Self {
            commands: vec![
                vec!["mn".into(), "-c".into()],
                vec!["killall".into(), "/usr/bin/ovs-testcontroller".into()],
            ],
        }
    }
}

impl EnvironmentReset for CommandReset {
    #[tracing::instrument(skip(self))]
    fn reset(&mut self) {
        info!("🧹 重置仿真环境");
        for argv in &self.commands {
            let Some((prog, args)) = argv.split_first() else {
                continue;
            };
            match Command::new(prog).args(args).output() {
                Ok(out) if out.status.success() => debug!(cmd = %argv.join(" "), "清理命令完成"),
                Ok(out) => warn!(
                    cmd = %argv.join(" "),
                    status = ?out.status.code(),
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "清理命令返回非零"
                ),
                Err(e) => warn!(cmd = %argv.join(" "), error = %e, "清理命令无法执行"),
            }
        }
    }
}
