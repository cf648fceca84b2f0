//! A plugin that triggers builds of downstream repositories.
//!
//! Try it with:
//!
//! ```text
//! PLUGIN_PLUGIN_DEBUG=1 DOWNSTREAM_SERVER=https://ci.example.com \
//!     cargo run --example downstream -- -fork -repositories octocat/hello
//! ```

use plugin_env::{ExecError, FieldRegistry};

fn main() {
    let mut registry = FieldRegistry::new();
    let fork = registry.bool("fork", false, "Trigger a new build for a repository");
    let repos = registry.string_list(
        "repositories",
        Vec::<String>::new(),
        "List of repositories to trigger",
    );
    let server = registry.string("server", "", "Trigger a drone build on a custom server");
    // "" keeps the default PLUGIN_SERVER in front of the aliases.
    registry.env(server, ["", "plugin_server2", "downstream_server", "downstream_server2"]);
    let token = registry.string("token", "", "Drone API token from your user settings");
    registry.env(token, ["downstream_token", ""]);
    registry.sensitive(token);
    let another = registry.string("another-option", "", "option without PLUGIN_ name");
    registry.env(another, ["another_option"]);
    registry.env_files([".env"]);

    plugin_env::run(registry, |ctx| {
        let mut valid = true;
        if ctx.get(token).is_empty() {
            ctx.usage(token, "you must provide your Drone access token.");
            valid = false;
        }
        if ctx.get(server).is_empty() {
            ctx.usage(server, "you must provide your Drone server.");
            valid = false;
        }
        if !valid {
            return Err(ExecError::Usage);
        }

        let fork = *ctx.get(fork);
        let repos = ctx.get(repos).clone();
        let server = ctx.get(server).clone();
        for repo in &repos {
            ctx.log()
                .println(format_args!("triggering {repo} on {server} (fork: {fork})"));
        }
        ctx.log().println("success!");
        Ok(())
    });
}
