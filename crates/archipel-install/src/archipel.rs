//! Archipel Server product definition

use installer_core::plan::{InstallationPlan, ParamSpec, StepAction, StepSpec};
use installer_core::ProductConfig;
use std::collections::BTreeMap;

const WELCOME: &str = "\
Welcome to the installation script of ArchipelServer.
Note that you must be root in order to install this software. Please answer the
following questions.
";

/// Ordered Archipel installation steps
pub const ARCHIPEL_STEPS: &[StepSpec] = &[
    StepSpec {
        id: "python_eggs",
        label: "install eggs",
        question: "Would you like to install needed python eggs ?",
        default: true,
        params: &[],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "binary",
        label: "binary folder",
        question: "Would you like to install Archipel binary ?",
        default: true,
        params: &[ParamSpec {
            name: "exec_dir",
            prompt: "Where do you want to install ArchipelServer ?",
            default: "/usr/bin",
        }],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "config_folder",
        label: "configuration folder",
        question: "Would you like to install Archipel default configuration ?",
        default: true,
        params: &[ParamSpec {
            name: "conf_dir",
            prompt: "Where do you want to install configuration ?",
            default: "/etc/archipel",
        }],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "data_folder",
        label: "data folder",
        question: "Would you like to create Archipel data folder ?",
        default: true,
        params: &[ParamSpec {
            name: "data_dir",
            prompt: "Where do you want ArchipelServer to store its data ?",
            default: "/var/lib/archipel",
        }],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "log_folder",
        label: "log folder",
        question: "Would you like to create Archipel log folder ?",
        default: true,
        params: &[ParamSpec {
            name: "log_dir",
            prompt: "Where do you want to store the log files ?",
            default: "/var/log/archipel",
        }],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "working_folders",
        label: "working folders",
        question: "Would you like to configure Archipel working folders (store all virtualization info) ?",
        default: true,
        params: &[
            ParamSpec {
                name: "drives_dir",
                prompt: "Where do you want to store drives ?",
                default: "/vm/drives",
            },
            ParamSpec {
                name: "iso_dir",
                prompt: "Where do you want to share isos ?",
                default: "/vm/iso",
            },
            ParamSpec {
                name: "tmp_dir",
                prompt: "Where do you want to store tmp files ?",
                default: "/vm/tmp",
            },
            ParamSpec {
                name: "repo_dir",
                prompt: "Where do you want the vmcasts repository ?",
                default: "/vm/repo",
            },
            ParamSpec {
                name: "vmcasts_dir",
                prompt: "Where do you want downloaded vmcasts ?",
                default: "/vm/vmcasts",
            },
        ],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "init_script",
        label: "install init script",
        question: "Would you like to install the init script ?",
        default: true,
        params: &[ParamSpec {
            name: "init_dir",
            prompt: "Where do you want to install init script ?",
            default: "/etc/init.d",
        }],
        requires: &[],
        capability: None,
        action: StepAction::System,
    },
    StepSpec {
        id: "start_on_boot",
        label: "start with system",
        question: "Would you like to start archipel with the system ?",
        default: true,
        params: &[],
        requires: &["init_script"],
        capability: Some("chkconfig"),
        action: StepAction::System,
    },
    StepSpec {
        id: "vnc_certificate",
        label: "vnc certificates",
        question: "Would you like to generate the VNC certificates ?",
        default: true,
        params: &[],
        requires: &["config_folder"],
        capability: Some("openssl"),
        action: StepAction::System,
    },
    StepSpec {
        id: "configure",
        label: "configure",
        question: "Would you like to configure Archipel server ?",
        default: true,
        params: &[],
        requires: &[],
        capability: None,
        action: StepAction::Configure,
    },
];

/// Archipel product configuration
#[derive(Clone)]
pub struct ArchipelConfig;

impl ProductConfig for ArchipelConfig {
    fn name(&self) -> &'static str {
        "archipel"
    }

    fn display_name(&self) -> &'static str {
        "Archipel Server"
    }

    fn welcome(&self) -> &'static str {
        WELCOME
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["easy_install"]
    }

    fn advisory_tools(&self) -> &'static [&'static str] {
        &["openssl", "chkconfig"]
    }

    fn steps(&self) -> &'static [StepSpec] {
        ARCHIPEL_STEPS
    }

    fn default_schema(&self) -> &'static str {
        include_str!("../schema/archipel.yaml")
    }

    fn schema_env(&self) -> &'static str {
        "ARCHIPEL_SCHEMA"
    }

    fn schema_context(&self, plan: &InstallationPlan) -> BTreeMap<String, String> {
        let mut context = plan.context(self.steps());
        context.insert("uuid".to_string(), uuid::Uuid::new_v4().to_string());
        context
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install archipel-install --force"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use installer_core::config::{ConfigValue, Generator};
    use installer_core::plan::{InstallationStep, PlanBuilder, StepParams};
    use installer_core::{PromptEngine, Schema, StaticTools};
    use std::io::Cursor;

    fn engine(input: &str) -> PromptEngine<Cursor<Vec<u8>>, Vec<u8>> {
        PromptEngine::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn schema() -> Schema {
        Schema::from_yaml(ArchipelConfig.default_schema()).unwrap()
    }

    /// Plan with only the configuration folder and the configure step enabled
    fn configure_only(conf_dir: &str) -> InstallationPlan {
        InstallationPlan::new(
            ARCHIPEL_STEPS
                .iter()
                .filter(|spec| spec.capability.is_none())
                .map(|spec| match spec.id {
                    "config_folder" => InstallationStep::enabled(
                        spec.id,
                        StepParams::from_iter([("conf_dir", conf_dir)]),
                    ),
                    "configure" => InstallationStep::enabled(spec.id, StepParams::new()),
                    _ => InstallationStep::declined(spec.id),
                })
                .collect(),
        )
    }

    #[test]
    fn test_catalog_is_valid() {
        let builder = PlanBuilder::new(ARCHIPEL_STEPS).unwrap();
        assert_eq!(builder.catalog().len(), 10);
    }

    #[test]
    fn test_embedded_schema_loads_and_binds() {
        let schema = schema();
        assert_eq!(schema.file_name(), "archipel.conf");
        assert_eq!(schema.flags().count(), 10);
        assert_eq!(schema.entries().len(), 56);

        let plan = configure_only("/tmp/etc");
        let bound = schema.bind(&ArchipelConfig.schema_context(&plan)).unwrap();

        // Declined steps fall back to their catalog defaults
        assert_eq!(
            bound.entry("GLOBAL", "general_exec_dir").unwrap().default,
            "/usr/bin/ArchipelServer"
        );
        assert_eq!(
            bound.entry("VIRTUALMACHINE", "vnc_certificate_file").unwrap().default,
            "/tmp/etc/vnc.pem"
        );
        assert_eq!(
            bound.entry("VMCASTING", "own_vmcast_name").unwrap().default,
            "Local VM Cast of $HOSTNAME"
        );
    }

    #[test]
    fn test_every_placeholder_is_provided() {
        let plan = InstallationPlan::default();
        let context = ArchipelConfig.schema_context(&plan);
        for name in schema().placeholders() {
            assert!(context.contains_key(&name), "no value for {{{}}}", name);
        }
    }

    #[test]
    fn test_uuid_changes_between_runs() {
        let plan = configure_only("/tmp/etc");
        let first = ArchipelConfig.schema_context(&plan);
        let second = ArchipelConfig.schema_context(&plan);
        assert_ne!(first["uuid"], second["uuid"]);
    }

    #[test]
    fn test_declining_every_step() {
        let builder = PlanBuilder::new(ARCHIPEL_STEPS).unwrap();
        // eggs, binary, conf, data, log, working, init, configure
        let mut e = engine("n\nn\nn\nn\nn\nn\nn\nn\n");
        let plan = builder
            .build(&mut e, &StaticTools::new(["openssl", "chkconfig"]))
            .unwrap();

        assert_eq!(plan.steps().len(), ARCHIPEL_STEPS.len());
        assert!(plan.is_noop());
    }

    #[test]
    fn test_optional_steps_need_their_tools() {
        let builder = PlanBuilder::new(ARCHIPEL_STEPS).unwrap();
        let input = "n\nn\ny\n\nn\nn\nn\ny\n\nn\n";
        let plan = builder.build(&mut engine(input), &StaticTools::none()).unwrap();

        assert!(plan.get("start_on_boot").is_none());
        assert!(plan.get("vnc_certificate").is_none());
        assert!(plan.is_enabled("init_script"));
        assert!(plan.is_enabled("config_folder"));
    }

    #[test]
    fn test_certificate_carries_configuration_folder() {
        let builder = PlanBuilder::new(ARCHIPEL_STEPS).unwrap();
        // conf y at /srv/conf, certificate y, everything else n
        let input = "n\nn\ny\n/srv/conf\nn\nn\nn\nn\ny\nn\n";
        let plan = builder
            .build(&mut engine(input), &StaticTools::new(["openssl"]))
            .unwrap();

        let cert = plan.get("vnc_certificate").and_then(|s| s.params()).unwrap();
        assert_eq!(cert.get("conf_dir"), Some("/srv/conf"));
    }

    #[test]
    fn test_health_only_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("etc");
        let plan = configure_only(conf_dir.to_str().unwrap());
        let bound = schema()
            .bind(&ArchipelConfig.schema_context(&plan))
            .unwrap();

        // Flags: only hypervisor_health on, then accept every default:
        // GLOBAL 5, HYPERVISOR 6, VIRTUALMACHINE 4, LOGGING 2, HEALTH 4
        let mut input = String::from("y\n");
        input.push_str(&"n\n".repeat(9));
        input.push_str(&"\n".repeat(21));

        let generator = Generator::new(&bound);
        let destination = generator.destination_in(&conf_dir);
        let report = generator
            .generate(&mut engine(&input), &destination)
            .unwrap();

        assert_eq!(
            report.values.domains(),
            vec![
                "GLOBAL",
                "MODULES",
                "HYPERVISOR",
                "VIRTUALMACHINE",
                "LOGGING",
                "HEALTH"
            ]
        );
        assert_eq!(
            report.values.get("VIRTUALMACHINE", "vnc_only_ssl"),
            Some(&ConfigValue::Bool(false))
        );

        let written = std::fs::read_to_string(conf_dir.join("archipel.conf")).unwrap();
        assert!(written.contains("[MODULES]\nhypervisor_health = True\n"));
        assert!(written.contains("vnc_certificate_file = "));
        assert!(!written.contains("[MEDIAS]"));
        assert!(!written.contains("iso_base_path"));
    }

    #[test]
    fn test_media_management_off_drops_iso_path() {
        let plan = configure_only("/tmp/etc");
        let bound = schema()
            .bind(&ArchipelConfig.schema_context(&plan))
            .unwrap();

        // Every flag keeps its default except media management
        let mut input = String::from("\n\nn\n");
        input.push_str(&"\n".repeat(7));
        input.push_str(&"\n".repeat(200));

        let report = Generator::new(&bound)
            .resolve(&mut engine(&input))
            .unwrap();

        assert!(report.values.get("MEDIAS", "iso_base_path").is_none());
        assert!(report.values.get("HEALTH", "health_database_path").is_some());
        assert!(report.values.get("IPHONENOTIFICATION", "credentials_key").is_none());
    }
}
