/// # Symbolic engine
/// expression tree of user formulas and its conversion into Rust closures
///# Example#
/// ```
/// use RustedNumLab::symbolic::symbolic_engine::Expr;
/// let input = "exp(x) + ln(y)";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let variables = parsed_expression.variables();
/// println!("variables {:?}", variables);
/// let function_of_x_and_y = parsed_expression.lambdify2D("x", "y").unwrap();
/// let f_res = function_of_x_and_y(0.0, 1.0);
/// assert_eq!(f_res, 1.0);
/// ```
pub mod symbolic_engine;
/// a module turns a String expression into a symbolic expression
pub mod parse_expr;
