mod cpp_method;
mod cpp_type;
