use bf_engine::{optimize, sanitize, Engine, EngineConfig};

fn main() {
    // Classic Brainfuck "Hello World!" program, with a comment for the sanitizer to drop
    let code = "Hello: ++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let program = optimize(&sanitize(code));
    println!("optimized: {program}");

    let cfg = match EngineConfig::new(false, false, 8, false) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(2);
        }
    };

    let mut engine = Engine::new(cfg);
    if let Err(err) = engine.run(&program) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    // Print a newline after the Brainfuck program output for readability
    println!();
    println!("{} steps, pointer at {}", engine.steps(), engine.pointer());

    // The loop leaves its counter at 0 and the four character cells to its right
    let cfg = engine.config();
    println!(
        "{}-bit cells, first five: {:?}",
        cfg.cell_bits.bits(),
        engine.tape().window(0, 5)
    );
}
