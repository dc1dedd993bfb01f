use crate::{CoreError, Instance};
use isctl_schema::{InstanceStatus, Product};
use std::path::PathBuf;

const MIN_FIELDS: usize = 8;
const DEFAULT_STATE: &str = "ok";

// Field positions in a `^`-delimited qlist record.
const NAME: usize = 0;
const DIRECTORY: usize = 1;
const VERSION: usize = 2;
const STATUS: usize = 3;
const CPF: usize = 4;
const SUPER_SERVER_PORT: usize = 5;
const WEB_SERVER_PORT: usize = 6;
const JDBC_PORT: usize = 7;
const STATE: usize = 8;
const PRODUCT: usize = 9;
const MIRROR_MEMBER_TYPE: usize = 10;
const MIRROR_STATUS: usize = 11;
const DATA_DIRECTORY: usize = 12;

fn malformed(record: &str, reason: impl Into<String>) -> CoreError {
    CoreError::MalformedRecord {
        record: record.to_owned(),
        reason: reason.into(),
    }
}

fn port(record: &str, fields: &[&str], index: usize, what: &str) -> Result<u16, CoreError> {
    fields[index]
        .parse()
        .map_err(|_| malformed(record, format!("invalid {what} port '{}'", fields[index])))
}

fn optional(fields: &[&str], index: usize) -> Option<String> {
    fields
        .get(index)
        .filter(|f| !f.is_empty())
        .map(|f| (*f).to_owned())
}

/// Split `status[,activity]` on the first comma.
fn split_status(field: &str) -> (InstanceStatus, String) {
    match field.split_once(',') {
        Some((status, activity)) => (InstanceStatus::parse(status), activity.trim().to_owned()),
        None => (InstanceStatus::parse(field), String::new()),
    }
}

impl Instance {
    /// Build an instance from one qlist record.
    pub fn from_qlist(record: &str) -> Result<Self, CoreError> {
        let mut instance = Self::default();
        instance.update_from_qlist(record)?;
        Ok(instance)
    }

    /// Overwrite every record-derived field from `record`.
    ///
    /// Records from older tools stop after the JDBC port; each later field is
    /// optional. On error the instance is left unchanged. The credential is
    /// not part of the record and is kept.
    pub fn update_from_qlist(&mut self, record: &str) -> Result<(), CoreError> {
        let record = record.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = record.split('^').collect();
        if fields.len() < MIN_FIELDS {
            return Err(malformed(
                record,
                format!(
                    "need at least {MIN_FIELDS} fields, found {}",
                    fields.len()
                ),
            ));
        }
        if fields[NAME].is_empty() {
            return Err(malformed(record, "empty instance name"));
        }

        let super_server_port = port(record, &fields, SUPER_SERVER_PORT, "super server")?;
        let web_server_port = port(record, &fields, WEB_SERVER_PORT, "web server")?;
        let jdbc_port = port(record, &fields, JDBC_PORT, "JDBC")?;

        let (status, activity) = split_status(fields[STATUS]);
        let directory = PathBuf::from(fields[DIRECTORY]);
        let data_directory = optional(&fields, DATA_DIRECTORY)
            .map_or_else(|| directory.clone(), PathBuf::from);
        let state = fields
            .get(STATE)
            .map_or(DEFAULT_STATE, |s| *s)
            .to_owned();

        *self = Self {
            name: fields[NAME].to_owned(),
            directory,
            data_directory,
            product: fields.get(PRODUCT).map(|p| Product::parse(p)).unwrap_or_default(),
            version: fields[VERSION].to_owned(),
            status,
            activity,
            cpf_file_name: fields[CPF].to_owned(),
            super_server_port,
            web_server_port,
            jdbc_port,
            state,
            mirror_member_type: optional(&fields, MIRROR_MEMBER_TYPE),
            mirror_status: optional(&fields, MIRROR_STATUS),
            credential: self.credential.take(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isctl_runtime::Credential;
    use nix::unistd::{Gid, Uid};

    const INSTTEST: &str = "INSTTEST^/ensemble/instances/insttest/^2015.2.2.805.0.16216^running, since Fri May 13 22:07:02 2016^cache.cpf^56772^57772^62972^ok^";

    #[test]
    fn legacy_eight_field_record() {
        let inst = Instance::from_qlist("INSTTEST^/d/^1.0^down, last used X^c.cpf^1^2^3").unwrap();
        assert_eq!(inst.name, "INSTTEST");
        assert_eq!(inst.status, InstanceStatus::Down);
        assert_eq!(inst.activity, "last used X");
        assert_eq!(
            (inst.super_server_port, inst.web_server_port, inst.jdbc_port),
            (1, 2, 3)
        );
        assert_eq!(inst.state, "ok");
        assert_eq!(inst.product, Product::Cache);
        assert_eq!(inst.data_directory, PathBuf::from("/d/"));
        assert_eq!(inst.mirror_member_type, None);
    }

    #[test]
    fn ensemble_record_with_trailing_field() {
        let inst = Instance::from_qlist(INSTTEST).unwrap();
        assert_eq!(inst.name, "INSTTEST");
        assert_eq!(inst.directory, PathBuf::from("/ensemble/instances/insttest/"));
        assert_eq!(inst.version, "2015.2.2.805.0.16216");
        assert_eq!(inst.status, InstanceStatus::Running);
        assert_eq!(inst.activity, "since Fri May 13 22:07:02 2016");
        assert_eq!(inst.cpf_file_name, "cache.cpf");
        assert_eq!(inst.super_server_port, 56772);
        assert_eq!(inst.web_server_port, 57772);
        assert_eq!(inst.jdbc_port, 62972);
        assert_eq!(inst.state, "ok");
        // An empty product column still defaults.
        assert_eq!(inst.product, Product::Cache);
    }

    #[test]
    fn full_thirteen_field_record() {
        let inst = Instance::from_qlist(
            "IRIS^/usr/irissys^2023.1^Running, since Tue^iris.cpf^1972^52773^0^warn^IRISHealth^Failover^Primary^/durable/iris",
        )
        .unwrap();
        assert_eq!(inst.status, InstanceStatus::Running);
        assert_eq!(inst.state, "warn");
        assert_eq!(inst.product, Product::Iris);
        assert_eq!(inst.mirror_member_type.as_deref(), Some("Failover"));
        assert_eq!(inst.mirror_status.as_deref(), Some("Primary"));
        assert_eq!(inst.data_directory, PathBuf::from("/durable/iris"));
        assert_eq!(inst.directory, PathBuf::from("/usr/irissys"));
    }

    #[test]
    fn every_length_from_eight_to_thirteen_parses() {
        let full = [
            "I", "/dir", "1.0", "running", "c.cpf", "1", "2", "3", "st", "Ensemble", "Async",
            "Backup", "/data",
        ];
        for len in MIN_FIELDS..=full.len() {
            let record = full[..len].join("^");
            let inst = Instance::from_qlist(&record)
                .unwrap_or_else(|e| panic!("{len} fields should parse: {e}"));
            assert_eq!(inst.state, if len > STATE { "st" } else { "ok" });
            assert_eq!(
                inst.product,
                if len > PRODUCT { Product::Ensemble } else { Product::Cache }
            );
            assert_eq!(inst.mirror_member_type.is_some(), len > MIRROR_MEMBER_TYPE);
            assert_eq!(inst.mirror_status.is_some(), len > MIRROR_STATUS);
            let expected_data = if len > DATA_DIRECTORY { "/data" } else { "/dir" };
            assert_eq!(inst.data_directory, PathBuf::from(expected_data));
        }
    }

    #[test]
    fn fewer_than_eight_fields_is_rejected() {
        for len in 0..MIN_FIELDS {
            let record = vec!["x"; len].join("^");
            let err = Instance::from_qlist(&record).unwrap_err();
            assert!(matches!(err, CoreError::MalformedRecord { .. }), "{len} fields");
        }
    }

    #[test]
    fn non_numeric_port_rejects_record() {
        let err = Instance::from_qlist("A^/d^1^down^c.cpf^1^x^3").unwrap_err();
        match err {
            CoreError::MalformedRecord { record, reason } => {
                assert_eq!(record, "A^/d^1^down^c.cpf^1^x^3");
                assert!(reason.contains("web server"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Instance::from_qlist("^/d^1^down^c.cpf^1^2^3").unwrap_err();
        assert!(err.to_string().contains("empty instance name"));
    }

    #[test]
    fn reparse_overwrites_everything_but_the_credential() {
        let mut inst = Instance::from_qlist(
            "A^/d^1^running^c.cpf^1^2^3^ok^IRIS^Failover^Primary^/data",
        )
        .unwrap();
        let credential = Credential {
            user: "irisusr".to_owned(),
            uid: Uid::from_raw(51773),
            gid: Gid::from_raw(51773),
        };
        inst.credential = Some(credential.clone());

        inst.update_from_qlist("A^/d^1^down^c.cpf^1^2^3").unwrap();
        assert_eq!(inst.status, InstanceStatus::Down);
        assert_eq!(inst.product, Product::Cache);
        assert_eq!(inst.mirror_member_type, None);
        assert_eq!(inst.data_directory, PathBuf::from("/d"));
        assert_eq!(inst.credential(), Some(&credential));
    }

    #[test]
    fn failed_reparse_leaves_instance_untouched() {
        let mut inst = Instance::from_qlist(INSTTEST).unwrap();
        let before = inst.clone();
        assert!(inst.update_from_qlist("broken").is_err());
        assert_eq!(inst, before);
    }

    #[test]
    fn status_without_activity() {
        let inst = Instance::from_qlist("A^/d^1^sign-on inhibited^c.cpf^1^2^3").unwrap();
        assert_eq!(inst.status, InstanceStatus::Inhibited);
        assert_eq!(inst.activity, "");
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let inst = Instance::from_qlist("A^/d^1^down^c.cpf^1^2^3\r\n").unwrap();
        assert_eq!(inst.jdbc_port, 3);
    }
}
