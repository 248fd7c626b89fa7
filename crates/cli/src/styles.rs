//! Help output colours.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Magenta.on_default().bold())
		.usage(AnsiColor::Magenta.on_default().bold())
		.literal(AnsiColor::Green.on_default())
		.placeholder(AnsiColor::Blue.on_default())
		.error(AnsiColor::Red.on_default().bold())
		.valid(AnsiColor::Green.on_default())
		.invalid(AnsiColor::Yellow.on_default())
}
