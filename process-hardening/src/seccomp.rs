use std::collections::BTreeMap;
use std::fmt::Display;

use seccompiler::BpfProgram;
use seccompiler::SeccompAction;
use seccompiler::SeccompCmpArgLen;
use seccompiler::SeccompCmpOp;
use seccompiler::SeccompCondition;
use seccompiler::SeccompFilter;
use seccompiler::SeccompRule;
use seccompiler::TargetArch;
use seccompiler::apply_filter;

use crate::SandboxError;

/// Installs filters on the current thread that fail process creation
/// and/or program execution with `EPERM`. Filters stack, so a later call can
/// only remove more.
pub(crate) fn deny_categories(deny_proc: bool, deny_exec: bool) -> Result<(), SandboxError> {
    let mut rules: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();

    if deny_exec {
        rules.insert(libc::SYS_execve, vec![]);
        rules.insert(libc::SYS_execveat, vec![]);
    }

    if deny_proc {
        #[cfg(target_arch = "x86_64")]
        {
            rules.insert(libc::SYS_fork, vec![]);
            rules.insert(libc::SYS_vfork, vec![]);
        }

        // clone(2) without CLONE_THREAD creates a new process; threads are
        // still allowed.
        let new_process = SeccompRule::new(vec![
            SeccompCondition::new(
                0,
                SeccompCmpArgLen::Qword,
                SeccompCmpOp::MaskedEq(libc::CLONE_THREAD as u64),
                0,
            )
            .map_err(seccomp_error)?,
        ])
        .map_err(seccomp_error)?;
        rules.insert(libc::SYS_clone, vec![new_process]);

        // clone3 passes its flags through memory, out of reach of the filter.
        // ENOSYS makes libc fall back to clone(2), which is checked above.
        let mut clone3: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();
        clone3.insert(libc::SYS_clone3, vec![]);
        install(clone3, libc::ENOSYS)?;
    }

    if rules.is_empty() {
        return Ok(());
    }
    install(rules, libc::EPERM)
}

fn install(rules: BTreeMap<i64, Vec<SeccompRule>>, errno: i32) -> Result<(), SandboxError> {
    let filter = SeccompFilter::new(
        rules,
        SeccompAction::Allow,
        SeccompAction::Errno(errno as u32),
        target_arch()?,
    )
    .map_err(seccomp_error)?;
    let program: BpfProgram = filter.try_into().map_err(seccomp_error)?;
    apply_filter(&program).map_err(seccomp_error)?;
    Ok(())
}

fn target_arch() -> Result<TargetArch, SandboxError> {
    if cfg!(target_arch = "x86_64") {
        Ok(TargetArch::x86_64)
    } else if cfg!(target_arch = "aarch64") {
        Ok(TargetArch::aarch64)
    } else {
        Err(SandboxError::Seccomp(format!(
            "unsupported architecture {}",
            std::env::consts::ARCH
        )))
    }
}

fn seccomp_error(err: impl Display) -> SandboxError {
    SandboxError::Seccomp(err.to_string())
}
