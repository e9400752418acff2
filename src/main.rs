use {
    hoist::{open_utf8_file, Args, Parser, Solution},
    tracing_subscriber::EnvFilter,
};

fn main() {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if args.verbose { "debug" } else { "warn" })
        }))
        .with_writer(std::io::stderr)
        .init();

    // SAFETY: This isn't truly safe, we're just hoping nobody touches our file before we're done
    // parsing it
    let outcome = unsafe {
        open_utf8_file(args.input_file_path("input/floors.txt"), |input| {
            match Solution::try_from(input) {
                Ok(solution) => {
                    if args.verbose {
                        println!("{}", solution.start());
                    }

                    match solution.fewest_moves() {
                        Ok(moves) => println!("{moves}"),
                        Err(error) => eprintln!("search failed: {error}"),
                    }
                }
                Err(error) => eprintln!("failed to parse input:\n{error:#?}"),
            }
        })
    };

    if let Err(error) = outcome {
        eprintln!("failed to open input file: {error}");
    }
}
