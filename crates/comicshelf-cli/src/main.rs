//! Binary entrypoint for the ComicShelf CLI.

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::process::exit(comicshelf_cli::run().await);
}
