use vector_pir::generate_main;
use vector_pir::pir::pir::RetrievalStrategy;

generate_main!(RetrievalStrategy::Linear);
