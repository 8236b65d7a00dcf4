//! Generate command handler

use healprobe::{deep_nesting, iframe_host, shadow_host, wide_branching, FixtureNode, FixturePage};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use crate::{GenerateArgs, GenerateLayout};

/// Build the fixture page for a layout. Every layout keys its target node
/// `target`.
pub fn generate_page(layout: &GenerateLayout) -> CliResult<FixturePage> {
    let page = match layout {
        GenerateLayout::Deep { depth, id } => {
            let mut leaf = FixtureNode::file_input().with_key("target");
            if let Some(id) = id {
                leaf = leaf.with_id(id.as_str());
            }
            FixturePage::new("Deep nesting").with_node(deep_nesting(*depth, leaf))
        }
        GenerateLayout::Wide { width, target } => {
            if target >= width {
                return Err(CliError::invalid_argument(format!(
                    "target index {target} is outside {width} siblings"
                )));
            }
            FixturePage::new("Wide branching").with_node(wide_branching(*width, *target))
        }
        GenerateLayout::Shadow { host } => FixturePage::new("Shadow upload").with_node(shadow_host(
            host,
            vec![FixtureNode::file_input().with_key("target")],
        )),
        GenerateLayout::Iframe { frame, cross_origin } => FixturePage::new("Iframe upload").with_node(iframe_host(
            frame,
            *cross_origin,
            vec![FixtureNode::file_input().with_key("target")],
        )),
    };
    Ok(page)
}

/// Execute the generate command
pub fn execute_generate(config: &CliConfig, args: &GenerateArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let page = generate_page(&args.layout)?;
    if config.verbosity.is_verbose() {
        reporter.info(&format!("generated '{}'", page.title));
    }
    print!("{}", page.to_yaml()?);
    Ok(())
}
