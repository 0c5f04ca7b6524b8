//! CLI entry point: open a window and view an avatar model.

use clap::Parser;

use vitrine::app::App;
use vitrine::ViewerConfig;

#[derive(Parser)]
#[command(name = "vitrine-view", version, about = "View a rigged glTF avatar")]
struct Args {
    /// Path or URL of the model (.glb / .gltf)
    source: String,

    /// Logical window width
    #[arg(long, default_value_t = 400)]
    width: u32,

    /// Logical window height
    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Window title
    #[arg(long)]
    title: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = ViewerConfig {
        window_size: (args.width, args.height),
        ..Default::default()
    };
    if let Some(title) = args.title {
        config.window_title = title;
    }

    App::new(config, args.source).run()?;
    Ok(())
}
