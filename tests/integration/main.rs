mod mock_source;
mod pipeline;
