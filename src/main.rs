fn main() {
    sketchdesk_lib::run()
}
