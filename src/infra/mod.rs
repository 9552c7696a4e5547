pub mod bit_buffer;
