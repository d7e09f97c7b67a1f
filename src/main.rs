use clap::{Parser, Subcommand};
use imgfs::header::resolution_from_str;
use imgfs::{
    Error, ListMode, Result, Server, Store, DEFAULT_MAX_FILES, DEFAULT_SMALL_RES,
    DEFAULT_THUMB_RES, MAX_SMALL_RES, MAX_THUMB_RES,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgfs", version = "1.0.0", about = "The imgFS command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and the table of valid images
    List { file: PathBuf },
    /// Create a new imgFS file
    Create {
        file: PathBuf,
        #[arg(long = "max_files", default_value_t = DEFAULT_MAX_FILES)]
        max_files: u32,
        #[arg(long = "thumb_res", num_args = 2, default_values_t = [DEFAULT_THUMB_RES.0, DEFAULT_THUMB_RES.1])]
        thumb_res: Vec<u16>,
        #[arg(long = "small_res", num_args = 2, default_values_t = [DEFAULT_SMALL_RES.0, DEFAULT_SMALL_RES.1])]
        small_res: Vec<u16>,
    },
    /// Read an image from an imgFS file to disk
    Read {
        file: PathBuf,
        img_id: String,
        /// thumbnail, small, or original (default original)
        #[arg(default_value = "original")]
        resolution: String,
    },
    /// Insert an image into an imgFS file
    Insert {
        file: PathBuf,
        img_id: String,
        image_path: PathBuf,
    },
    /// Delete an image from an imgFS file
    Delete { file: PathBuf, img_id: String },
    /// Open an imgFS file and serve it over HTTP
    Serve {
        file: PathBuf,
        #[arg(default_value_t = imgfs::DEFAULT_LISTENING_PORT)]
        port: u16,
    },
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::List { file } => {
            let store = Store::open(&file)?;
            if let Some(json) = store.list(ListMode::Stdout)? {
                println!("{}", json);
            }
        }

        Commands::Create {
            file,
            max_files,
            thumb_res,
            small_res,
        } => {
            let in_bounds = |v: u16, max: u16| v != 0 && v <= max;
            if !in_bounds(thumb_res[0], MAX_THUMB_RES.0) || !in_bounds(thumb_res[1], MAX_THUMB_RES.1)
                || !in_bounds(small_res[0], MAX_SMALL_RES.0) || !in_bounds(small_res[1], MAX_SMALL_RES.1)
            {
                return Err(Error::Resolutions);
            }
            let resized_res = [thumb_res[0], thumb_res[1], small_res[0], small_res[1]];
            let store = Store::create(&file, max_files, resized_res)?;
            println!("{} file created", file.display());
            store.close()?;
        }

        Commands::Read {
            file,
            img_id,
            resolution,
        } => {
            let res = resolution_from_str(&resolution)?;
            let mut store = Store::open(&file)?;
            let bytes = store.read(&img_id, res)?;
            let out_path = format!("{}_{}.jpg", img_id, resolution);
            std::fs::write(&out_path, &bytes)?;
            println!("Image written to {}", out_path);
            store.close()?;
        }

        Commands::Insert {
            file,
            img_id,
            image_path,
        } => {
            let buffer = std::fs::read(&image_path)?;
            let mut store = Store::open(&file)?;
            store.insert(&buffer, &img_id)?;
            println!("Image inserted as '{}'", img_id);
            store.close()?;
        }

        Commands::Delete { file, img_id } => {
            let mut store = Store::open(&file)?;
            store.delete(&img_id)?;
            println!("Image '{}' deleted", img_id);
            store.close()?;
        }

        Commands::Serve { file, port } => {
            let store = Store::open(&file)?;
            let addr = format!("0.0.0.0:{}", port);
            let server = Server::bind(&addr, store)?;
            server.run()?;
            server.close()?;
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR: {}", e.short_message());
        std::process::exit(e.code());
    }
}
