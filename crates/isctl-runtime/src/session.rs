/// A session tool invocation split into its executable and fixed leading
/// arguments, e.g. `iris session` becomes `iris` with leading `session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCommand {
    pub program: String,
    pub leading_args: Vec<String>,
}

impl SessionCommand {
    pub fn parse(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            leading_args: parts.collect(),
        }
    }

    /// Full argument list for running `command` in `namespace` of `instance`.
    pub fn args(&self, instance: &str, namespace: &str, command: &str) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            instance.to_owned(),
            "-U".to_owned(),
            namespace.to_owned(),
            command.to_owned(),
        ]);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_program_has_no_leading_args() {
        let s = SessionCommand::parse("csession");
        assert_eq!(s.program, "csession");
        assert!(s.leading_args.is_empty());
        assert_eq!(
            s.args("INST", "%SYS", "MAIN^X"),
            ["INST", "-U", "%SYS", "MAIN^X"]
        );
    }

    #[test]
    fn embedded_arguments_come_first() {
        let s = SessionCommand::parse("/usr/bin/iris  session");
        assert_eq!(s.program, "/usr/bin/iris");
        assert_eq!(
            s.args("IRIS", "USER", "x"),
            ["session", "IRIS", "-U", "USER", "x"]
        );
    }
}
