use crate::client::api_proxy::{ApiProxy, YouTubeApi};
use crate::client::cli::formatter;
use crate::client::core::playlist_manager::PlaylistManager;
use crate::client::core::search_manager::SearchManager;
use crate::util::errors::ApiError;
use clap::{Parser, Subcommand};
use log::{debug, error};

#[derive(Parser)]
#[clap(name = "ytpl")]
#[command(about = "YouTube playlist terminal application", version = "0.1")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Playlists, // lists the ids of the playlists on the account
    Show {
        id: String,      // the playlist to describe
        #[arg(long)]
        pretty: bool,    // if true, human readable (title, id, channel)
    }, // shows a playlist's details
    Videos {
        id: String,      // the playlist whose videos to list
    }, // lists the video ids in a playlist
    Create {
        title: String,   // the title of the new playlist
        #[arg(short, long)]
        description: Option<String>,
    }, // creates a new playlist
    Edit {
        id: String,      // the playlist to edit
        title: String,   // the new title
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, default_value = "public")]
        privacy: String, // public, private, or unlisted
    }, // edits a playlist's details
    Add {
        playlist: String, // the playlist to add to
        video: String,    // the video to add
    }, // adds a video to a playlist
    Remove {
        item: String,    // the playlist item to remove
    }, // removes an entry from a playlist
    Delete {
        id: String,      // the playlist to delete
    }, // deletes a playlist
    Clone {
        source: String,  // the playlist to copy, from any channel
        #[arg(short, long)]
        title: Option<String>, // title for the copy
    }, // clones a playlist onto the account
    Merge {
        target: String,  // the playlist that receives the videos
        source: String,  // the playlist that is merged away
    }, // merges two playlists, deleting the source
    Top {
        #[arg(short, long)]
        playlist: Option<String>, // if absent, every playlist on the account is searched
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,    // how many titles to return
    }, // the most viewed video titles
    Search {
        query: String,   // the search query
        #[arg(short, long, default_value = "video")]
        kind: String,    // video, playlist, or channel
        #[arg(long)]
        pretty: bool,    // if true, human readable (title, channel, id)
    }, // searches YouTube
}

async fn run<A: YouTubeApi + Sync>(api: &A, cli: Cli) -> Result<Option<String>, ApiError> {
    let playlist_manager = PlaylistManager::new(api);
    let search_manager = SearchManager::new(api);

    match cli.command {
        Commands::Playlists => {
            let ids = playlist_manager.my_playlists().await?;
            Ok(Some(formatter::print_id_list(&ids)))
        }
        Commands::Show { id, pretty } => {
            let json = playlist_manager.playlist_details(&id).await?;
            if pretty {
                Ok(Some(formatter::print_playlist_list_pretty(
                    &json["items"],
                    0,
                )))
            } else {
                Ok(Some(json.to_string()))
            }
        }
        Commands::Videos { id } => {
            let ids = playlist_manager.playlist_videos(&id).await?;
            Ok(Some(formatter::print_id_list(&ids)))
        }
        Commands::Create { title, description } => {
            let id = playlist_manager
                .create_playlist(&title, description.as_deref())
                .await?;
            Ok(Some(format!("Created playlist {}.", id)))
        }
        Commands::Edit {
            id,
            title,
            description,
            privacy,
        } => {
            playlist_manager
                .edit_playlist(&id, &title, description.as_deref(), &privacy)
                .await?;
            Ok(Some(format!("Updated playlist {}.", id)))
        }
        Commands::Add { playlist, video } => {
            playlist_manager.add_video(&playlist, &video).await?;
            Ok(Some(format!("Added {} to {}.", video, playlist)))
        }
        Commands::Remove { item } => {
            playlist_manager.remove_video(&item).await?;
            Ok(Some(format!("Removed playlist item {}.", item)))
        }
        Commands::Delete { id } => {
            playlist_manager.delete_playlist(&id).await?;
            Ok(Some(format!("Deleted playlist {}.", id)))
        }
        Commands::Clone { source, title } => {
            let target = playlist_manager
                .clone_playlist(&source, title.as_deref())
                .await?;
            Ok(Some(format!("Cloned {} into {}.", source, target)))
        }
        Commands::Merge { target, source } => {
            playlist_manager.merge_playlists(&target, &source).await?;
            Ok(Some(format!("Merged {} into {}.", source, target)))
        }
        Commands::Top { playlist, count } => {
            let titles = playlist_manager
                .top_videos(playlist.as_deref(), count)
                .await?;
            if titles.is_empty() {
                Ok(Some("No videos found.".to_string()))
            } else {
                Ok(Some(formatter::print_ranked_titles(&titles)))
            }
        }
        Commands::Search {
            query,
            kind,
            pretty,
        } => {
            let json = search_manager.search(&query, &kind).await?;
            if pretty {
                Ok(Some(formatter::print_search_hit_list_pretty(
                    &json["items"],
                    0,
                )))
            } else {
                Ok(Some(formatter::print_search_hit_list(&json["items"], 0)))
            }
        }
    }
}

pub async fn run_cli(api_proxy: &ApiProxy, args: Vec<String>) {
    let cli = Cli::parse_from(args);

    debug!("Dispatching parsed command.");

    match run(api_proxy, cli).await {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
        }
    }
}
