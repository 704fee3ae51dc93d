fn main() {
    bracket_admin_lib::run()
}
