//! different utility modules used throughout the project
/// logger initialisation and saving of result points into csv
pub mod logger;
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3" into a calculation task
pub mod task_parser;
