pub mod game_tests;
