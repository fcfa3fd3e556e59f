use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use comfyui_tools::tools::{self, GenerateRequest, ImgEditRequest};
use comfyui_tools::{logging, ComfyUIClient, Config, TemplateStore, ToolContext};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser, Debug)]
#[command(name = "comfyctl", about = "Run the ComfyUI image tools from the command line", version)]
struct Cli {
    /// Override COMFYUI_URL
    #[arg(global = true, long)]
    comfyui_url: Option<String>,

    /// Override OUTPUT_DIR
    #[arg(global = true, long, value_name = "PATH")]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Positive prompt text
    prompt: Option<String>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long, alias = "batchsize")]
    batch_size: Option<u32>,
    /// Negative prompt text
    #[arg(long, value_name = "TEXT")]
    negative: Option<String>,
    /// Checkpoint name (see `comfyctl checkpoints`)
    #[arg(long)]
    model: Option<String>,
    /// Directory, or file path for a single image
    #[arg(long, value_name = "PATH")]
    save_dir: Option<String>,
    /// File name prefix
    #[arg(long)]
    filename: Option<String>,
}

impl From<GenerateArgs> for GenerateRequest {
    fn from(args: GenerateArgs) -> Self {
        GenerateRequest {
            prompt: args.prompt,
            width: args.width,
            height: args.height,
            batch_size: args.batch_size,
            negative_prompt: args.negative,
            model: args.model,
            save_dir: args.save_dir,
            filename: args.filename,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate images from a prompt
    Txt2img(GenerateArgs),
    /// Generate a background or scene and save it locally
    Txt2bg(GenerateArgs),
    /// Edit one or two images with a prompt
    Imgedit {
        /// Edit instruction
        prompt: String,
        /// First input image (absolute path or URL)
        #[arg(long)]
        image1: String,
        /// Optional second input image
        #[arg(long)]
        image2: Option<String>,
        /// One of 16:9, 9:16, 3:4, 4:3
        #[arg(long)]
        aspect_ratio: Option<String>,
        #[arg(long)]
        guidance: Option<f64>,
        #[arg(long)]
        steps: Option<u32>,
        #[arg(long, value_name = "PATH")]
        save_dir: Option<String>,
        #[arg(long)]
        filename: Option<String>,
    },
    /// List the checkpoints available on the server
    Checkpoints,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::new();
    logging::init("warn", BoxMakeWriter::new(std::io::stderr), conf.log_dir.as_deref())?;
    if let Some(url) = cli.comfyui_url {
        conf.comfyui_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = cli.output_dir {
        conf.output_dir = dir.into();
    }

    let templates = TemplateStore::load(&conf.templates_dir).await?;
    let client = Arc::new(ComfyUIClient::new(conf.comfyui_url.clone()));
    let ctx = ToolContext::new(&conf, client, templates);

    let result = match cli.command {
        Commands::Txt2img(args) => tools::txt2img(&ctx, args.into()).await,
        Commands::Txt2bg(args) => tools::txt2bg(&ctx, args.into()).await,
        Commands::Imgedit {
            prompt, image1, image2, aspect_ratio, guidance, steps, save_dir, filename,
        } => {
            let request = ImgEditRequest {
                prompt: Some(prompt),
                image1: Some(image1),
                image2,
                aspect_ratio,
                guidance,
                steps,
                save_dir,
                filename,
            };
            tools::imgedit(&ctx, request).await
        }
        Commands::Checkpoints => tools::checkpoint_list(&ctx).await,
    };

    match result {
        Ok(markdown) => {
            println!("{}", markdown);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
