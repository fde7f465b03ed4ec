//! Rewrites historic invocation forms into flags the grammar understands.
//!
//! * `+` becomes `-c$` (go to the last line).
//! * `+cmd` becomes `-ccmd`.
//! * `-` becomes `-s`.
//! * the element following a bare `-c`, `-T`, `-t` or `-w` is that flag's
//!   argument and is never rewritten.
//!
//! Rewriting stops at a literal `--` so a file named `+foo` can still be
//! edited.

/// Flags whose argument may be the following element.
const FLAGS_WITH_ARGUMENT: [char; 4] = ['c', 'T', 't', 'w'];

pub fn normalize_legacy_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut normalized = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }

        if let Some(command) = arg.strip_prefix('+') {
            if command.is_empty() {
                normalized.push("-c$".to_string());
            } else {
                normalized.push(format!("-c{command}"));
            }
        } else if arg == "-" {
            normalized.push("-s".to_string());
        } else if takes_separate_argument(&arg) {
            normalized.push(arg);
            if let Some(value) = args.next() {
                normalized.push(value);
            }
        } else {
            normalized.push(arg);
        }
    }

    normalized
}

fn takes_separate_argument(arg: &str) -> bool {
    let mut chars = arg.chars();
    chars.next() == Some('-')
        && chars.next().is_some_and(|c| FLAGS_WITH_ARGUMENT.contains(&c))
        && chars.next().is_none()
}
