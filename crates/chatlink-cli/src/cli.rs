//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data directory for state persistence
    #[arg(short, long)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and send the verification email
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation
        #[arg(long)]
        confirm: String,
    },
    /// Check whether the pending sign-up has been verified
    Verify {
        /// Mark the pending account's email as confirmed first (local backend only)
        #[arg(long)]
        confirm: bool,
    },
    /// Send the verification email again
    Resend,
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out of the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or edit profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Upload an image and use it as your avatar
    Avatar {
        /// Image file to upload
        #[arg(short, long)]
        file: PathBuf,
        /// Content type; guessed from the file extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// List users you have no relationship with yet
    Explore(ListArgs),
    /// List your friends
    Friends(ListArgs),
    /// List friend requests
    Requests {
        /// Show requests you sent instead of requests you received
        #[arg(long)]
        sent: bool,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Send a friend request
    Request {
        /// Target user id
        user: String,
    },
    /// Accept a friend request
    Accept {
        /// Requester user id
        user: String,
    },
    /// Reject a friend request
    Reject {
        /// Requester user id
        user: String,
    },
    /// Send a direct message
    Send {
        /// Recipient user id
        #[arg(short, long)]
        to: String,
        /// Message content
        message: String,
    },
    /// Show the conversation with a user
    History {
        /// Counterpart user id
        user: String,
    },
    /// Run a scripted two-user walkthrough against a fresh in-memory backend
    Demo,
    /// Print an example configuration file
    ExampleConfig,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show your profile or another user's
    Show {
        /// User id; defaults to yourself
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Edit your profile; a blank value clears the field
    Edit(ProfileEditArgs),
}

#[derive(Args, Debug, Default)]
pub struct ProfileEditArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Birth date, e.g. 1990-04-21
    #[arg(long)]
    pub birth_date: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive filter on display name
    #[arg(short, long)]
    pub search: Option<String>,
}
