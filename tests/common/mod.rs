/// Do snapshot testing for a rendered report (strips ANSI codes)
#[macro_export]
macro_rules! assert_report_snapshot {
    ($out:expr, @$snapshot:literal) => {
        insta::assert_snapshot!(strip_ansi_escapes::strip_str(&$out), @$snapshot)
    };
}

/// Registry shaped like the downstream-trigger plugin.
pub mod downstream {
    use plugin_env::{BoolValue, FieldHandle, FieldRegistry, StringListValue, StringValue};

    pub struct Fields {
        pub repos: FieldHandle<StringListValue>,
        pub server: FieldHandle<StringValue>,
        pub token: FieldHandle<StringValue>,
        pub fork: FieldHandle<BoolValue>,
        pub another: FieldHandle<StringValue>,
    }

    pub fn registry() -> (FieldRegistry, Fields) {
        let mut reg = FieldRegistry::new();
        let fork = reg.bool("fork", false, "Trigger a new build for a repository");
        let repos = reg.string_list("repositories", Vec::<String>::new(), "List of repositories to trigger");
        let server = reg.string("server", "", "Trigger a drone build on a custom server");
        reg.env(server, ["", "plugin_server2", "downstream_server", "downstream_server2"]);
        let token = reg.string("token", "", "Drone API token from your user settings");
        reg.env(token, ["downstream_token", ""]);
        let another = reg.string("another-option", "", "option without PLUGIN_ name");
        reg.env(another, ["another_option"]);
        (
            reg,
            Fields {
                repos,
                server,
                token,
                fork,
                another,
            },
        )
    }
}
