mod collector_lifecycle;
mod commons;
