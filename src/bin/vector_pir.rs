use vector_pir::generate_main;

generate_main!();
